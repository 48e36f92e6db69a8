//! racetrace - happens-before data race detection
//!
//! racetrace consumes a trace of memory accesses and synchronization events
//! from a multi-threaded program and reports pairs of accesses to the same
//! location that are not ordered by happens-before, using the DJIT+
//! vector-clock algorithm.
//!
//! # Quick Start
//!
//! ```
//! use racetrace::{Session, SessionConfig, ScriptSource};
//!
//! let script = "
//!     var x
//!     rd(0,x)
//!     rd(1,x)
//!     wr(0,x)
//!     wr(1,x)
//! ";
//! let report = Session::new(SessionConfig::default())?
//!     .run(ScriptSource::from_text(script))?;
//!
//! assert_eq!(report.violations.len(), 2);
//! # Ok::<(), racetrace::RaceError>(())
//! ```
//!
//! # Architecture
//!
//! - `racetrace-core`: vector clocks, events, errors
//! - `racetrace-concurrency`: the detector and its clock table
//! - `racetrace-engine`: event sources, sinks, configuration, sessions
//!
//! Embedders with their own capture layer use [`Detector`] (or
//! [`SharedDetector`] across threads) directly; trace files go through
//! [`Session`].

pub use racetrace_concurrency::{
    handler_fn, read_races, write_races, AccessKind, ClockSnapshot, ClockTable, Detector,
    DetectorConfig, DetectorMetrics, FnHandler, HandlerChain, LocationSnapshot, LocationState,
    LockSnapshot, SharedDetector, TracingHandler, Violation, ViolationHandler, ViolationLog,
};
pub use racetrace_core::{
    EntityKind, Event, Location, Lock, RaceError, RaceResult, Registration, ThreadHandle,
    ThreadId, TraceRecord, VectorClock,
};
pub use racetrace_engine::{
    parse_line, parse_script, EventSource, RecordSource, ScriptSource, Session, SessionConfig,
    SessionReport, SharedBuffer, TraceSink, TraceTable, UntrackedPolicy, ViolationPrinter,
    CONFIG_FILE_NAME,
};
