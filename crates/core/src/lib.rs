//! Core types for racetrace
//!
//! This crate defines the foundational types used throughout the system:
//! - ThreadId / ThreadHandle: thread identity and fork/join tokens
//! - Location / Lock: the tracked entities
//! - VectorClock: the happens-before partial order
//! - Event / Registration / TraceRecord: the trace vocabulary
//! - RaceError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod event;
pub mod types;

pub use clock::VectorClock;
pub use error::{RaceError, RaceResult};
pub use event::{EntityKind, Event, Registration, TraceRecord};
pub use types::{Location, Lock, ThreadHandle, ThreadId};
