//! Point-in-time copies of the clock table
//!
//! A snapshot owns its clocks, so later events cannot change it. It is the
//! end-of-run dump handed to reporters and can be exported with serde.

use racetrace_core::{Location, Lock, ThreadId, VectorClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Read/write clocks of one location at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// The location
    pub location: Location,
    /// Last-read clock
    pub read: VectorClock,
    /// Last-write clock
    pub write: VectorClock,
}

/// Release clock of one lock at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// The lock
    pub lock: Lock,
    /// Release clock
    pub clock: VectorClock,
}

/// Every clock of a detector at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Thread clocks, by id
    pub threads: BTreeMap<ThreadId, VectorClock>,
    /// Location clocks, in registration order
    pub locations: Vec<LocationSnapshot>,
    /// Lock clocks, in registration order
    pub locks: Vec<LockSnapshot>,
}

impl ClockSnapshot {
    /// Clock of `thread`, zero if it was never observed
    pub fn thread_clock(&self, thread: ThreadId) -> VectorClock {
        self.threads.get(&thread).cloned().unwrap_or_default()
    }

    /// Snapshot of `location`, if it was registered
    pub fn location(&self, location: &Location) -> Option<&LocationSnapshot> {
        self.locations.iter().find(|l| &l.location == location)
    }

    /// Snapshot of `lock`, if it was registered
    pub fn lock(&self, lock: &Lock) -> Option<&LockSnapshot> {
        self.locks.iter().find(|l| &l.lock == lock)
    }
}

impl fmt::Display for ClockSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (thread, clock) in &self.threads {
            writeln!(f, "Thread {}'s VC: {}", thread, clock)?;
        }
        for entry in &self.locations {
            writeln!(f, "Read VC for location {}: {}", entry.location, entry.read)?;
        }
        for entry in &self.locations {
            writeln!(f, "Write VC for location {}: {}", entry.location, entry.write)?;
        }
        for entry in &self.locks {
            writeln!(f, "Release VC for lock {}: {}", entry.lock, entry.clock)?;
        }
        Ok(())
    }
}
