//! Race predicates for memory accesses
//!
//! Key rules:
//! - A read races if the location's last-write clock is not ordered at or
//!   before the reader's clock
//! - A write races if either the last-write **or** the last-read clock is not
//!   ordered at or before the writer's clock
//! - Reads are never checked against other reads
//!
//! Both predicates are evaluated after the accessing thread's own component
//! has been recorded; that component equals the thread's current time and so
//! never trips the check by itself.

use crate::clock_table::{ClockTable, LocationState};
use racetrace_core::{Location, ThreadId, VectorClock};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of access that raced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// A read not ordered after the last writes
    Read,
    /// A write not ordered after the last reads and writes
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => f.write_str("rd"),
            AccessKind::Write => f.write_str("wr"),
        }
    }
}

/// True if a read by the thread owning `thread_clock` races
pub fn read_races(state: &LocationState, thread_clock: &VectorClock) -> bool {
    state.write_clock().gt(thread_clock)
}

/// True if a write by the thread owning `thread_clock` races
pub fn write_races(state: &LocationState, thread_clock: &VectorClock) -> bool {
    state.write_clock().gt(thread_clock) || state.read_clock().gt(thread_clock)
}

/// A detected candidate data race
///
/// Carries copies of the clocks involved at detection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Racing access kind
    pub kind: AccessKind,
    /// Accessing thread
    pub thread: ThreadId,
    /// Accessed location
    pub location: Location,
    /// Accessing thread's clock
    pub thread_clock: VectorClock,
    /// Location's last-read clock, after the access was recorded
    pub read_clock: VectorClock,
    /// Location's last-write clock, after the access was recorded
    pub write_clock: VectorClock,
}

impl Violation {
    /// Capture the clocks relevant to a race from `clocks`
    ///
    /// Missing entries are captured as zero clocks.
    pub fn capture(
        kind: AccessKind,
        clocks: &ClockTable,
        thread: ThreadId,
        location: &Location,
    ) -> Self {
        let state = clocks.location_state(location).ok();
        Violation {
            kind,
            thread,
            location: location.clone(),
            thread_clock: clocks.thread_clock(thread).cloned().unwrap_or_default(),
            read_clock: state.map(|s| s.read_clock().clone()).unwrap_or_default(),
            write_clock: state.map(|s| s.write_clock().clone()).unwrap_or_default(),
        }
    }

    /// Describe the clocks involved: `C[T1]=<..>, R[x]=<..>, W[x]=<..>`
    pub fn clock_summary(&self) -> String {
        match self.kind {
            AccessKind::Read => format!(
                "C[{}]={}, W[{}]={}",
                self.thread, self.thread_clock, self.location, self.write_clock
            ),
            AccessKind::Write => format!(
                "C[{}]={}, R[{}]={}, W[{}]={}",
                self.thread,
                self.thread_clock,
                self.location,
                self.read_clock,
                self.location,
                self.write_clock
            ),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "race condition detected: {}({},{})",
            self.kind,
            self.thread.get(),
            self.location
        )
    }
}
