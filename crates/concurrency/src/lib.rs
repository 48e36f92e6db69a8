//! Happens-before race detection engine
//!
//! This crate implements the DJIT+ vector-clock algorithm with:
//! - ClockTable: per-thread, per-location and per-lock clocks
//! - Detector: event application and race predicates
//! - ViolationHandler: injected race reporting
//! - ClockSnapshot: point-in-time copies for reporters
//! - SharedDetector: single-writer access from multiple capture threads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock_table;
pub mod detector;
pub mod handler;
pub mod shared;
pub mod snapshot;
pub mod validation;

pub use clock_table::{ClockTable, LocationState};
pub use detector::{Detector, DetectorConfig, DetectorMetrics};
pub use handler::{handler_fn, FnHandler, HandlerChain, TracingHandler, ViolationHandler, ViolationLog};
pub use shared::SharedDetector;
pub use snapshot::{ClockSnapshot, LocationSnapshot, LockSnapshot};
pub use validation::{read_races, write_races, AccessKind, Violation};
