//! Happens-before race detector (DJIT+)
//!
//! The detector applies trace events to its [`ClockTable`] and evaluates the
//! race predicates after every access.
//!
//! ## Event semantics
//!
//! ```text
//! Read(t, x)     R[x][t] := C[t][t];  race if W[x] ≰ C[t]
//! Write(t, x)    W[x][t] := C[t][t];  race if W[x] ≰ C[t] or R[x] ≰ C[t]
//! Acquire(t, m)  C[t] := C[t] ⊔ L[m]
//! Release(t, m)  C[t][t] += 1;  L[m] := copy of C[t]
//! Fork(t, h)     u := new thread bound to h;  C[u] := C[u] ⊔ C[t];  C[t][t] += 1
//! Join(t, h)     u := thread bound to h;  C[t] := C[t] ⊔ C[u];  C[u][u] += 1
//! ```
//!
//! Events must be applied in the order the traced program executed them.
//! An event naming an unregistered location or lock, or joining an unknown
//! handle, fails before any clock is touched.

use crate::clock_table::ClockTable;
use crate::handler::ViolationHandler;
use crate::snapshot::ClockSnapshot;
use crate::validation::{read_races, write_races, AccessKind, Violation};
use racetrace_core::{
    Event, Location, Lock, RaceResult, Registration, ThreadHandle, ThreadId, TraceRecord,
    VectorClock,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Detector configuration
///
/// # Example
///
/// ```toml
/// # Pre-create threads 0..initial_threads, each with its own component at 1
/// initial_threads = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of threads to create up front (ids `0..initial_threads`)
    #[serde(default)]
    pub initial_threads: u32,
}

/// Detector counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorMetrics {
    /// Events applied successfully
    pub events_applied: u64,
    /// Read races reported
    pub read_violations: u64,
    /// Write races reported
    pub write_violations: u64,
    /// Threads observed so far
    pub threads: u64,
}

impl DetectorMetrics {
    /// Read plus write races
    pub fn total_violations(&self) -> u64 {
        self.read_violations + self.write_violations
    }
}

/// A single analysis session
///
/// Owns all clocks; nothing else mutates them. Independent sessions are
/// independent `Detector` values.
pub struct Detector {
    table: ClockTable,
    handler: Option<Box<dyn ViolationHandler>>,
    metrics: DetectorMetrics,
}

impl Detector {
    /// Create a detector with no threads, locations or locks
    pub fn new() -> Self {
        Self {
            table: ClockTable::new(),
            handler: None,
            metrics: DetectorMetrics::default(),
        }
    }

    /// Create a detector from `config`
    pub fn with_config(config: &DetectorConfig) -> Self {
        let mut detector = Self::new();
        for raw in 0..config.initial_threads {
            detector.ensure_thread(ThreadId::new(raw));
        }
        detector
    }

    /// Install `handler`, replacing any previous one
    pub fn set_violation_handler(&mut self, handler: impl ViolationHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Install `handler`, builder style
    pub fn with_violation_handler(mut self, handler: impl ViolationHandler + 'static) -> Self {
        self.set_violation_handler(handler);
        self
    }

    /// Remove and return the installed handler
    ///
    /// Races keep being detected and counted; they are just not reported.
    pub fn take_violation_handler(&mut self) -> Option<Box<dyn ViolationHandler>> {
        self.handler.take()
    }

    /// Start tracking a location
    ///
    /// # Errors
    /// `AlreadyRegistered` if it is tracked already.
    pub fn register_location(&mut self, location: impl Into<Location>) -> RaceResult<Location> {
        let location = location.into();
        self.table.register_location(location.clone())?;
        debug!(target: "racetrace::detector", location = %location, "Location registered");
        Ok(location)
    }

    /// Start tracking a lock
    ///
    /// # Errors
    /// `AlreadyRegistered` if it is tracked already.
    pub fn register_lock(&mut self, lock: impl Into<Lock>) -> RaceResult<Lock> {
        let lock = lock.into();
        self.table.register_lock(lock.clone())?;
        debug!(target: "racetrace::detector", lock = %lock, "Lock registered");
        Ok(lock)
    }

    /// Apply an out-of-band registration
    pub fn register(&mut self, registration: &Registration) -> RaceResult<()> {
        match registration {
            Registration::Location(location) => {
                self.register_location(location.clone())?;
            }
            Registration::Lock(lock) => {
                self.register_lock(lock.clone())?;
            }
        }
        Ok(())
    }

    /// Introduce `thread` explicitly; no-op if already observed
    pub fn ensure_thread(&mut self, thread: ThreadId) {
        self.table.ensure_thread(thread);
    }

    /// Apply one event, returning the race it exposed, if any
    ///
    /// The installed handler, if any, has already been invoked when this
    /// returns.
    pub fn apply(&mut self, event: &Event) -> RaceResult<Option<Violation>> {
        match event {
            Event::Read { thread, location } => self.read(*thread, location),
            Event::Write { thread, location } => self.write(*thread, location),
            Event::Acquire { thread, lock } => self.acquire(*thread, lock).map(|_| None),
            Event::Release { thread, lock } => self.release(*thread, lock).map(|_| None),
            Event::Fork { thread, handle } => self.fork(*thread, *handle).map(|_| None),
            Event::Join { thread, handle } => self.join(*thread, *handle).map(|_| None),
        }
    }

    /// Apply a registration or an event
    pub fn apply_record(&mut self, record: &TraceRecord) -> RaceResult<Option<Violation>> {
        match record {
            TraceRecord::Register(registration) => self.register(registration).map(|_| None),
            TraceRecord::Event(event) => self.apply(event),
        }
    }

    /// `thread` reads `location`
    pub fn read(&mut self, thread: ThreadId, location: &Location) -> RaceResult<Option<Violation>> {
        let raced = {
            let (clock, state) = self.table.access_entry(thread, location)?;
            state.read.set(thread, clock.get(thread));
            read_races(state, clock)
        };
        self.finish_access(AccessKind::Read, raced, thread, location)
    }

    /// `thread` writes `location`
    pub fn write(&mut self, thread: ThreadId, location: &Location) -> RaceResult<Option<Violation>> {
        let raced = {
            let (clock, state) = self.table.access_entry(thread, location)?;
            state.write.set(thread, clock.get(thread));
            write_races(state, clock)
        };
        self.finish_access(AccessKind::Write, raced, thread, location)
    }

    /// `thread` acquires `lock`: inherit the last releaser's knowledge
    pub fn acquire(&mut self, thread: ThreadId, lock: &Lock) -> RaceResult<()> {
        let released = self.table.lock_clock(lock)?.clone();
        self.table.ensure_thread(thread).merge_into(&released);
        self.metrics.events_applied += 1;
        Ok(())
    }

    /// `thread` releases `lock`: tick, then publish a copy of its clock
    pub fn release(&mut self, thread: ThreadId, lock: &Lock) -> RaceResult<()> {
        self.table.lock_clock(lock)?;
        let published = {
            let clock = self.table.ensure_thread(thread);
            clock.increment(thread);
            clock.clone()
        };
        *self.table.lock_clock_mut(lock)? = published;
        self.metrics.events_applied += 1;
        Ok(())
    }

    /// `parent` spawns the thread object `handle`; returns the child's id
    ///
    /// # Errors
    /// `ThreadIdsExhausted` if a thread with id `u32::MAX` was already
    /// observed, leaving no id for the child.
    pub fn fork(&mut self, parent: ThreadId, handle: ThreadHandle) -> RaceResult<ThreadId> {
        let child = self.table.allocate_thread(parent, handle)?;
        let parent_clock = self.table.ensure_thread(parent).clone();
        self.table.ensure_thread(child).merge_into(&parent_clock);
        self.table.ensure_thread(parent).increment(parent);
        debug!(
            target: "racetrace::detector",
            parent = %parent,
            child = %child,
            handle = %handle,
            "Thread forked"
        );
        self.metrics.events_applied += 1;
        Ok(child)
    }

    /// `parent` joins the thread object `handle`; returns the child's id
    ///
    /// # Errors
    /// `UnknownThreadHandle` if no fork bound `handle`.
    pub fn join(&mut self, parent: ThreadId, handle: ThreadHandle) -> RaceResult<ThreadId> {
        let child = self.table.resolve_handle(handle)?;
        self.table.ensure_thread(parent);
        let child_clock = self.table.ensure_thread(child).clone();
        self.table.ensure_thread(parent).merge_into(&child_clock);
        self.table.ensure_thread(child).increment(child);
        debug!(
            target: "racetrace::detector",
            parent = %parent,
            child = %child,
            handle = %handle,
            "Thread joined"
        );
        self.metrics.events_applied += 1;
        Ok(child)
    }

    fn finish_access(
        &mut self,
        kind: AccessKind,
        raced: bool,
        thread: ThreadId,
        location: &Location,
    ) -> RaceResult<Option<Violation>> {
        self.metrics.events_applied += 1;
        if !raced {
            return Ok(None);
        }

        match kind {
            AccessKind::Read => self.metrics.read_violations += 1,
            AccessKind::Write => self.metrics.write_violations += 1,
        }
        if let Some(handler) = self.handler.as_mut() {
            match kind {
                AccessKind::Read => handler.on_read_violation(&self.table, thread, location),
                AccessKind::Write => handler.on_write_violation(&self.table, thread, location),
            }
        }
        Ok(Some(Violation::capture(kind, &self.table, thread, location)))
    }

    /// Read-only view of every clock
    pub fn clocks(&self) -> &ClockTable {
        &self.table
    }

    /// Current clock of `thread`, if observed
    pub fn thread_clock(&self, thread: ThreadId) -> Option<&VectorClock> {
        self.table.thread_clock(thread)
    }

    /// Last-read clock of `location`
    pub fn read_clock(&self, location: &Location) -> RaceResult<&VectorClock> {
        self.table.read_clock(location)
    }

    /// Last-write clock of `location`
    pub fn write_clock(&self, location: &Location) -> RaceResult<&VectorClock> {
        self.table.write_clock(location)
    }

    /// Release clock of `lock`
    pub fn lock_clock(&self, lock: &Lock) -> RaceResult<&VectorClock> {
        self.table.lock_clock(lock)
    }

    /// Registered locations, in registration order
    pub fn locations(&self) -> &[Location] {
        self.table.locations()
    }

    /// Registered locks, in registration order
    pub fn locks(&self) -> &[Lock] {
        self.table.locks()
    }

    /// Current counters
    pub fn metrics(&self) -> DetectorMetrics {
        DetectorMetrics {
            threads: self.table.thread_count() as u64,
            ..self.metrics.clone()
        }
    }

    /// Copy every clock
    pub fn snapshot(&self) -> ClockSnapshot {
        self.table.snapshot()
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("table", &self.table)
            .field("has_handler", &self.handler.is_some())
            .field("metrics", &self.metrics)
            .finish()
    }
}
