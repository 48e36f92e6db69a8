//! Trace events consumed by the detector
//!
//! A trace is a sequence of [`TraceRecord`]s: registrations of the entities to
//! track, interleaved with synchronization and access [`Event`]s in the order
//! the traced program executed them.

use crate::types::{Location, Lock, ThreadHandle, ThreadId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A synchronization or memory-access event of the traced program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    /// `thread` read `location`
    Read {
        /// Accessing thread
        thread: ThreadId,
        /// Location read
        location: Location,
    },
    /// `thread` wrote `location`
    Write {
        /// Accessing thread
        thread: ThreadId,
        /// Location written
        location: Location,
    },
    /// `thread` acquired `lock`
    Acquire {
        /// Acquiring thread
        thread: ThreadId,
        /// Lock acquired
        lock: Lock,
    },
    /// `thread` released `lock`
    Release {
        /// Releasing thread
        thread: ThreadId,
        /// Lock released
        lock: Lock,
    },
    /// `thread` spawned the thread object named by `handle`
    Fork {
        /// Parent thread
        thread: ThreadId,
        /// Handle of the spawned thread
        handle: ThreadHandle,
    },
    /// `thread` joined the thread object named by `handle`
    Join {
        /// Joining thread
        thread: ThreadId,
        /// Handle of the joined thread
        handle: ThreadHandle,
    },
}

impl Event {
    /// Read of `location` by `thread`
    pub fn read(thread: impl Into<ThreadId>, location: impl Into<Location>) -> Self {
        Event::Read {
            thread: thread.into(),
            location: location.into(),
        }
    }

    /// Write of `location` by `thread`
    pub fn write(thread: impl Into<ThreadId>, location: impl Into<Location>) -> Self {
        Event::Write {
            thread: thread.into(),
            location: location.into(),
        }
    }

    /// Acquire of `lock` by `thread`
    pub fn acquire(thread: impl Into<ThreadId>, lock: impl Into<Lock>) -> Self {
        Event::Acquire {
            thread: thread.into(),
            lock: lock.into(),
        }
    }

    /// Release of `lock` by `thread`
    pub fn release(thread: impl Into<ThreadId>, lock: impl Into<Lock>) -> Self {
        Event::Release {
            thread: thread.into(),
            lock: lock.into(),
        }
    }

    /// Spawn of `handle` by `thread`
    pub fn fork(thread: impl Into<ThreadId>, handle: impl Into<ThreadHandle>) -> Self {
        Event::Fork {
            thread: thread.into(),
            handle: handle.into(),
        }
    }

    /// Join of `handle` by `thread`
    pub fn join(thread: impl Into<ThreadId>, handle: impl Into<ThreadHandle>) -> Self {
        Event::Join {
            thread: thread.into(),
            handle: handle.into(),
        }
    }

    /// The thread performing the event
    pub fn thread(&self) -> ThreadId {
        match self {
            Event::Read { thread, .. }
            | Event::Write { thread, .. }
            | Event::Acquire { thread, .. }
            | Event::Release { thread, .. }
            | Event::Fork { thread, .. }
            | Event::Join { thread, .. } => *thread,
        }
    }

    /// The location accessed, for Read/Write
    pub fn location(&self) -> Option<&Location> {
        match self {
            Event::Read { location, .. } | Event::Write { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The lock operated on, for Acquire/Release
    pub fn lock(&self) -> Option<&Lock> {
        match self {
            Event::Acquire { lock, .. } | Event::Release { lock, .. } => Some(lock),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Read { thread, location } => write!(f, "rd({},{})", thread.get(), location),
            Event::Write { thread, location } => write!(f, "wr({},{})", thread.get(), location),
            Event::Acquire { thread, lock } => write!(f, "acq({},{})", thread.get(), lock),
            Event::Release { thread, lock } => write!(f, "rel({},{})", thread.get(), lock),
            Event::Fork { thread, handle } => write!(f, "fork({},{})", thread.get(), handle),
            Event::Join { thread, handle } => write!(f, "join({},{})", thread.get(), handle),
        }
    }
}

/// Kind of a registrable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A tracked memory location
    Location,
    /// A tracked lock
    Lock,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Location => f.write_str("location"),
            EntityKind::Lock => f.write_str("lock"),
        }
    }
}

/// Out-of-band registration of an entity to track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Registration {
    /// Track a memory location
    Location(Location),
    /// Track a lock
    Lock(Lock),
}

impl Registration {
    /// Which kind of entity is registered
    pub fn kind(&self) -> EntityKind {
        match self {
            Registration::Location(_) => EntityKind::Location,
            Registration::Lock(_) => EntityKind::Lock,
        }
    }

    /// The registered entity's name
    pub fn name(&self) -> &str {
        match self {
            Registration::Location(location) => location.name(),
            Registration::Lock(lock) => lock.name(),
        }
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Location(location) => write!(f, "var {}", location),
            Registration::Lock(lock) => write!(f, "lock {}", lock),
        }
    }
}

/// One element of a trace: a registration or an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceRecord {
    /// Entity registration; must precede events naming the entity
    Register(Registration),
    /// Program event
    Event(Event),
}

impl From<Event> for TraceRecord {
    fn from(event: Event) -> Self {
        TraceRecord::Event(event)
    }
}

impl From<Registration> for TraceRecord {
    fn from(registration: Registration) -> Self {
        TraceRecord::Register(registration)
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceRecord::Register(registration) => registration.fmt(f),
            TraceRecord::Event(event) => event.fmt(f),
        }
    }
}
