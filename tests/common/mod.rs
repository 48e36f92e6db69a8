//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use racetrace::{
    RaceResult, ScriptSource, Session, SessionConfig, SessionReport, SharedBuffer, TraceTable,
};
use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Route library logs through the test harness's captured output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Session config with `threads` pre-created threads and nothing watched.
pub fn threads(threads: u32) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.detector.initial_threads = threads;
    config
}

/// Run `script` under `config`.
pub fn run_script(config: SessionConfig, script: &str) -> RaceResult<SessionReport> {
    init_tracing();
    Session::new(config)?.run(ScriptSource::from_text(script))
}

/// Run `script` under `config`, returning the report and the trace table text.
pub fn run_with_table(config: SessionConfig, script: &str) -> (SessionReport, String) {
    init_tracing();
    let buffer = SharedBuffer::new();
    let mut session = Session::new(config).unwrap();
    session.add_sink(TraceTable::new(buffer.clone()));
    let report = session.run(ScriptSource::from_text(script)).unwrap();
    (report, buffer.contents())
}

/// Printed line of every reported race, in order.
pub fn race_lines(report: &SessionReport) -> Vec<String> {
    report.violations.iter().map(|v| v.to_string()).collect()
}

// ============================================================================
// Scripts
// ============================================================================

/// Unsynchronized reads then writes of x by two threads.
pub const UNSYNCHRONIZED: &str = "\
var x
lock m
rd(0,x)
rd(1,x)
wr(0,x)
wr(1,x)
";

/// The same accesses, each thread's inside a critical section on m.
pub const LOCK_PROTECTED: &str = "\
var x
lock m
acq(0,m)
rd(0,x)
wr(0,x)
rel(0,m)
acq(1,m)
rd(1,x)
wr(1,x)
rel(1,m)
";

/// Child writes x, parent joins it and then reads x.
pub const FORK_JOIN: &str = "\
var x
fork(0,7)
wr(1,x)
join(0,7)
rd(0,x)
";
