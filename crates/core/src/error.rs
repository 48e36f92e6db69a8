//! Error types for racetrace
//!
//! Usage errors surfaced by the detector and its drivers. A detected race is
//! a finding, never an error.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::event::EntityKind;
use crate::types::{Location, Lock, ThreadHandle};
use std::io;
use thiserror::Error;

/// Result type alias for racetrace operations
pub type RaceResult<T> = std::result::Result<T, RaceError>;

/// Error types for racetrace
#[derive(Debug, Error)]
pub enum RaceError {
    /// An event referenced a location that was never registered
    #[error("Unknown location '{location}': register it before tracing accesses")]
    UnknownLocation {
        /// The unregistered location
        location: Location,
    },

    /// An event referenced a lock that was never registered
    #[error("Unknown lock '{lock}': register it before tracing lock operations")]
    UnknownLock {
        /// The unregistered lock
        lock: Lock,
    },

    /// A join named a handle no fork ever bound
    #[error("Unknown thread handle {handle}: no fork created it")]
    UnknownThreadHandle {
        /// The unresolved handle
        handle: ThreadHandle,
    },

    /// A fork needed a fresh thread id but every id is in use
    #[error("No unused thread id left for the child of a fork on handle {handle}")]
    ThreadIdsExhausted {
        /// The handle the fork tried to bind
        handle: ThreadHandle,
    },

    /// An entity was registered twice
    #[error("{kind} '{name}' is already registered")]
    AlreadyRegistered {
        /// Kind of entity
        kind: EntityKind,
        /// Entity name
        name: String,
    },

    /// Malformed scripted trace
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (trace files, report output)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RaceError {
    /// Build a parse error for `line`
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        RaceError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        RaceError::Config(message.into())
    }

    /// Stable name of the error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            RaceError::UnknownLocation { .. } => "UnknownLocation",
            RaceError::UnknownLock { .. } => "UnknownLock",
            RaceError::UnknownThreadHandle { .. } => "UnknownThreadHandle",
            RaceError::ThreadIdsExhausted { .. } => "ThreadIdsExhausted",
            RaceError::AlreadyRegistered { .. } => "AlreadyRegistered",
            RaceError::Parse { .. } => "Parse",
            RaceError::Config(_) => "Config",
            RaceError::Io(_) => "Io",
        }
    }

    /// True for errors caused by referencing something not set up first
    pub fn is_unknown_entity(&self) -> bool {
        matches!(
            self,
            RaceError::UnknownLocation { .. }
                | RaceError::UnknownLock { .. }
                | RaceError::UnknownThreadHandle { .. }
        )
    }
}
