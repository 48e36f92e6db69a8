//! Trace-driven race detection sessions
//!
//! This crate drives a detector from a recorded trace:
//! - EventSource: scripted text traces and in-memory record lists
//! - TraceSink: per-event clock tables and race lines
//! - SessionConfig: `racetrace.toml` settings
//! - Session: runs a source to completion and reports the final clocks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod session;
pub mod sink;
pub mod source;

pub use config::{SessionConfig, UntrackedPolicy, CONFIG_FILE_NAME};
pub use session::{Session, SessionReport};
pub use sink::{SharedBuffer, TraceSink, TraceTable, ViolationPrinter};
pub use source::{parse_line, parse_script, EventSource, RecordSource, ScriptSource};
