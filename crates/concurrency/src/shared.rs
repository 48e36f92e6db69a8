//! Single-writer access to a detector from many capture threads
//!
//! Clock merges read and write several table entries one component at a
//! time, so two events must never be applied concurrently and a reader must
//! never observe a half-merged clock. Every operation here, queries
//! included, runs under one exclusive lock.

use crate::clock_table::ClockTable;
use crate::detector::{Detector, DetectorMetrics};
use crate::snapshot::ClockSnapshot;
use crate::validation::Violation;
use parking_lot::Mutex;
use racetrace_core::{Event, Location, Lock, RaceResult, ThreadHandle, ThreadId};
use std::sync::Arc;

/// A [`Detector`] shared between threads
///
/// Cloning yields another handle to the same detector.
#[derive(Debug, Clone)]
pub struct SharedDetector {
    inner: Arc<Mutex<Detector>>,
}

impl SharedDetector {
    /// Share `detector`
    pub fn new(detector: Detector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    /// Start tracking a location
    pub fn register_location(&self, location: impl Into<Location>) -> RaceResult<Location> {
        self.inner.lock().register_location(location)
    }

    /// Start tracking a lock
    pub fn register_lock(&self, lock: impl Into<Lock>) -> RaceResult<Lock> {
        self.inner.lock().register_lock(lock)
    }

    /// Apply one event under the lock
    pub fn apply(&self, event: &Event) -> RaceResult<Option<Violation>> {
        self.inner.lock().apply(event)
    }

    /// Fork under the lock, returning the child's id
    pub fn fork(&self, parent: ThreadId, handle: ThreadHandle) -> RaceResult<ThreadId> {
        self.inner.lock().fork(parent, handle)
    }

    /// Join under the lock, returning the child's id
    pub fn join(&self, parent: ThreadId, handle: ThreadHandle) -> RaceResult<ThreadId> {
        self.inner.lock().join(parent, handle)
    }

    /// Run `f` against a consistent view of every clock
    pub fn with_clocks<R>(&self, f: impl FnOnce(&ClockTable) -> R) -> R {
        let guard = self.inner.lock();
        f(guard.clocks())
    }

    /// Run `f` with exclusive access to the detector
    pub fn with_detector<R>(&self, f: impl FnOnce(&mut Detector) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Copy every clock
    pub fn snapshot(&self) -> ClockSnapshot {
        self.inner.lock().snapshot()
    }

    /// Current counters
    pub fn metrics(&self) -> DetectorMetrics {
        self.inner.lock().metrics()
    }

    /// Recover the detector if this is the last handle
    pub fn try_into_inner(self) -> Result<Detector, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Detector> for SharedDetector {
    fn from(detector: Detector) -> Self {
        Self::new(detector)
    }
}
