//! Violation handlers
//!
//! The detector invokes its handler synchronously, from inside `apply`, with
//! the clock table as it stands after the racing access was recorded. The
//! handler decides presentation; the detector never deduplicates.

use crate::clock_table::ClockTable;
use crate::validation::{AccessKind, Violation};
use parking_lot::Mutex;
use racetrace_core::{Location, ThreadId};
use std::sync::Arc;
use tracing::warn;

/// Receives race findings from a [`Detector`](crate::Detector)
pub trait ViolationHandler: Send {
    /// A read by `thread` of `location` raced with an earlier write
    fn on_read_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location);

    /// A write by `thread` of `location` raced with an earlier read or write
    fn on_write_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location);
}

/// Adapter turning a closure into a [`ViolationHandler`]
pub struct FnHandler<F>(F);

/// Wrap `f` as a handler; `f` receives the kind of the racing access
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(AccessKind, &ClockTable, ThreadId, &Location) + Send,
{
    FnHandler(f)
}

impl<F> ViolationHandler for FnHandler<F>
where
    F: FnMut(AccessKind, &ClockTable, ThreadId, &Location) + Send,
{
    fn on_read_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        (self.0)(AccessKind::Read, clocks, thread, location)
    }

    fn on_write_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        (self.0)(AccessKind::Write, clocks, thread, location)
    }
}

/// Collects every violation, in report order
///
/// Clones share the same log, so a caller can keep one clone and hand the
/// other to the detector.
#[derive(Debug, Clone, Default)]
pub struct ViolationLog {
    entries: Arc<Mutex<Vec<Violation>>>,
}

impl ViolationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded violations
    pub fn entries(&self) -> Vec<Violation> {
        self.entries.lock().clone()
    }

    /// Remove and return all recorded violations
    pub fn drain(&self) -> Vec<Violation> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of recorded violations
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn record(&self, kind: AccessKind, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        self.entries
            .lock()
            .push(Violation::capture(kind, clocks, thread, location));
    }
}

impl ViolationHandler for ViolationLog {
    fn on_read_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        self.record(AccessKind::Read, clocks, thread, location);
    }

    fn on_write_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        self.record(AccessKind::Write, clocks, thread, location);
    }
}

/// Emits one `tracing` warning per race, with the clocks involved
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

impl TracingHandler {
    fn emit(kind: AccessKind, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        let violation = Violation::capture(kind, clocks, thread, location);
        warn!(
            target: "racetrace::race",
            kind = %kind,
            thread = %thread,
            location = %location,
            clocks = %violation.clock_summary(),
            "Data race detected"
        );
    }
}

impl ViolationHandler for TracingHandler {
    fn on_read_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        Self::emit(AccessKind::Read, clocks, thread, location);
    }

    fn on_write_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        Self::emit(AccessKind::Write, clocks, thread, location);
    }
}

/// Forwards every report to each inner handler in turn
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<Box<dyn ViolationHandler>>,
}

impl HandlerChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler
    pub fn push(&mut self, handler: impl ViolationHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Append a handler, builder style
    pub fn with(mut self, handler: impl ViolationHandler + 'static) -> Self {
        self.push(handler);
        self
    }

    /// Number of handlers in the chain
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if the chain forwards nowhere
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl ViolationHandler for HandlerChain {
    fn on_read_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        for handler in &mut self.handlers {
            handler.on_read_violation(clocks, thread, location);
        }
    }

    fn on_write_violation(&mut self, clocks: &ClockTable, thread: ThreadId, location: &Location) {
        for handler in &mut self.handlers {
            handler.on_write_violation(clocks, thread, location);
        }
    }
}
