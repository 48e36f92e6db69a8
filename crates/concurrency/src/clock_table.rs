//! Keyed storage for every vector clock the detector maintains
//!
//! - one clock per thread, created explicitly by [`ClockTable::ensure_thread`]
//! - a (last-read, last-write) clock pair per registered location
//! - a release clock per registered lock
//!
//! Locations and locks exist only once registered. Accesses never create
//! them, which keeps the tracked set explicit and bounded.

use crate::snapshot::{ClockSnapshot, LocationSnapshot, LockSnapshot};
use racetrace_core::{
    EntityKind, Location, Lock, RaceError, RaceResult, ThreadHandle, ThreadId, VectorClock,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Last-read and last-write clocks of one tracked location
///
/// Component `t` of each clock is thread `t`'s logical time at its most
/// recent read (resp. write) of the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationState {
    pub(crate) read: VectorClock,
    pub(crate) write: VectorClock,
}

impl LocationState {
    /// Clock of the most recent read by each thread
    pub fn read_clock(&self) -> &VectorClock {
        &self.read
    }

    /// Clock of the most recent write by each thread
    pub fn write_clock(&self) -> &VectorClock {
        &self.write
    }
}

/// All clocks of one analysis session
#[derive(Debug, Clone, Default)]
pub struct ClockTable {
    threads: BTreeMap<ThreadId, VectorClock>,
    locations: BTreeMap<Location, LocationState>,
    location_order: Vec<Location>,
    locks: BTreeMap<Lock, VectorClock>,
    lock_order: Vec<Lock>,
    handles: BTreeMap<ThreadHandle, ThreadId>,
    /// One past the highest thread id ever seen, wider than an id so it
    /// can sit past `u32::MAX`
    next_thread: u64,
}

fn one_past(thread: ThreadId) -> u64 {
    u64::from(thread.get()) + 1
}

fn thread_entry<'a>(
    threads: &'a mut BTreeMap<ThreadId, VectorClock>,
    next_thread: &mut u64,
    thread: ThreadId,
) -> &'a mut VectorClock {
    *next_thread = (*next_thread).max(one_past(thread));
    threads.entry(thread).or_insert_with(|| {
        trace!(target: "racetrace::clock", thread = %thread, "Thread clock created");
        VectorClock::for_thread(thread)
    })
}

impl ClockTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the clock of `thread`, creating it on first reference
    ///
    /// A new thread starts with its own component at 1.
    pub fn ensure_thread(&mut self, thread: ThreadId) -> &mut VectorClock {
        thread_entry(&mut self.threads, &mut self.next_thread, thread)
    }

    /// True if `thread` has been observed
    pub fn contains_thread(&self, thread: ThreadId) -> bool {
        self.threads.contains_key(&thread)
    }

    /// Start tracking `location` with zero read and write clocks
    ///
    /// # Errors
    /// `AlreadyRegistered` if the location is tracked already; its state is
    /// left untouched.
    pub fn register_location(&mut self, location: Location) -> RaceResult<()> {
        if self.locations.contains_key(&location) {
            return Err(RaceError::AlreadyRegistered {
                kind: EntityKind::Location,
                name: location.name().to_string(),
            });
        }
        self.locations
            .insert(location.clone(), LocationState::default());
        self.location_order.push(location);
        Ok(())
    }

    /// Start tracking `lock` with a zero release clock
    ///
    /// # Errors
    /// `AlreadyRegistered` if the lock is tracked already.
    pub fn register_lock(&mut self, lock: Lock) -> RaceResult<()> {
        if self.locks.contains_key(&lock) {
            return Err(RaceError::AlreadyRegistered {
                kind: EntityKind::Lock,
                name: lock.name().to_string(),
            });
        }
        self.locks.insert(lock.clone(), VectorClock::new());
        self.lock_order.push(lock);
        Ok(())
    }

    /// True if `location` is registered
    pub fn is_location_registered(&self, location: &Location) -> bool {
        self.locations.contains_key(location)
    }

    /// True if `lock` is registered
    pub fn is_lock_registered(&self, lock: &Lock) -> bool {
        self.locks.contains_key(lock)
    }

    /// Current clock of `thread`, if observed
    pub fn thread_clock(&self, thread: ThreadId) -> Option<&VectorClock> {
        self.threads.get(&thread)
    }

    /// Read/write state of `location`
    pub fn location_state(&self, location: &Location) -> RaceResult<&LocationState> {
        self.locations
            .get(location)
            .ok_or_else(|| RaceError::UnknownLocation {
                location: location.clone(),
            })
    }

    /// Last-read clock of `location`
    pub fn read_clock(&self, location: &Location) -> RaceResult<&VectorClock> {
        self.location_state(location).map(LocationState::read_clock)
    }

    /// Last-write clock of `location`
    pub fn write_clock(&self, location: &Location) -> RaceResult<&VectorClock> {
        self.location_state(location).map(LocationState::write_clock)
    }

    /// Release clock of `lock`
    pub fn lock_clock(&self, lock: &Lock) -> RaceResult<&VectorClock> {
        self.locks.get(lock).ok_or_else(|| RaceError::UnknownLock { lock: lock.clone() })
    }

    pub(crate) fn lock_clock_mut(&mut self, lock: &Lock) -> RaceResult<&mut VectorClock> {
        self.locks
            .get_mut(lock)
            .ok_or_else(|| RaceError::UnknownLock { lock: lock.clone() })
    }

    /// Borrow the accessing thread's clock together with the location's state
    ///
    /// The location is checked first, so an unknown location creates no
    /// thread.
    pub(crate) fn access_entry(
        &mut self,
        thread: ThreadId,
        location: &Location,
    ) -> RaceResult<(&VectorClock, &mut LocationState)> {
        let state = self
            .locations
            .get_mut(location)
            .ok_or_else(|| RaceError::UnknownLocation {
                location: location.clone(),
            })?;
        let clock = thread_entry(&mut self.threads, &mut self.next_thread, thread);
        Ok((clock, state))
    }

    /// Bind `handle` to a fresh thread forked from `parent` and create both
    /// clocks
    ///
    /// The child gets the lowest id above every thread observed so far,
    /// `parent` included. A handle that is already bound is rebound: capture
    /// layers reuse the storage of finished thread objects.
    ///
    /// # Errors
    /// `ThreadIdsExhausted` if no id above the highest observed one remains;
    /// the table is left untouched.
    pub(crate) fn allocate_thread(
        &mut self,
        parent: ThreadId,
        handle: ThreadHandle,
    ) -> RaceResult<ThreadId> {
        let next = self.next_thread.max(one_past(parent));
        let thread = u32::try_from(next)
            .map(ThreadId::new)
            .map_err(|_| RaceError::ThreadIdsExhausted { handle })?;

        self.ensure_thread(parent);
        if let Some(previous) = self.handles.insert(handle, thread) {
            trace!(
                target: "racetrace::clock",
                handle = %handle,
                previous = %previous,
                thread = %thread,
                "Thread handle rebound"
            );
        }
        self.ensure_thread(thread);
        Ok(thread)
    }

    /// Thread bound to `handle` by the most recent fork
    pub fn thread_for_handle(&self, handle: ThreadHandle) -> Option<ThreadId> {
        self.handles.get(&handle).copied()
    }

    pub(crate) fn resolve_handle(&self, handle: ThreadHandle) -> RaceResult<ThreadId> {
        self.thread_for_handle(handle)
            .ok_or(RaceError::UnknownThreadHandle { handle })
    }

    /// Observed threads and their clocks, in id order
    pub fn threads(&self) -> impl Iterator<Item = (ThreadId, &VectorClock)> {
        self.threads.iter().map(|(&t, clock)| (t, clock))
    }

    /// Observed thread ids, in id order
    pub fn thread_ids(&self) -> Vec<ThreadId> {
        self.threads.keys().copied().collect()
    }

    /// Number of observed threads
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Registered locations, in registration order
    pub fn locations(&self) -> &[Location] {
        &self.location_order
    }

    /// Registered locks, in registration order
    pub fn locks(&self) -> &[Lock] {
        &self.lock_order
    }

    /// Copy every clock into a self-contained snapshot
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            threads: self.threads.clone(),
            locations: self
                .location_order
                .iter()
                .filter_map(|location| {
                    self.locations.get(location).map(|state| LocationSnapshot {
                        location: location.clone(),
                        read: state.read.clone(),
                        write: state.write.clone(),
                    })
                })
                .collect(),
            locks: self
                .lock_order
                .iter()
                .filter_map(|lock| {
                    self.locks.get(lock).map(|clock| LockSnapshot {
                        lock: lock.clone(),
                        clock: clock.clone(),
                    })
                })
                .collect(),
        }
    }
}
