//! Sessions configured from `racetrace.toml`

use crate::common::*;
use racetrace::{
    RaceError, ScriptSource, Session, SessionConfig, UntrackedPolicy, CONFIG_FILE_NAME,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn watched_entities_and_skip_policy_from_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &config_path,
        r#"
watch_locations = ["0x1000"]
watch_locks = ["0x2000"]
untracked = "skip"

[detector]
initial_threads = 2
"#,
    )
    .unwrap();
    let trace_path = dir.path().join("trace.rt");
    fs::write(
        &trace_path,
        "# only 0x1000 and 0x2000 are watched\n\
         acq(0,0x2000)\n\
         wr(0,0x1000)\n\
         wr(0,0x9999)\n\
         rel(0,0x2000)\n\
         acq(1,0x2000)\n\
         rd(1,0x9999)\n\
         rd(1,0x1000)\n\
         rel(1,0x2000)\n",
    )
    .unwrap();

    let config = SessionConfig::from_file(&config_path).unwrap();
    assert_eq!(config.untracked, UntrackedPolicy::Skip);

    let report = Session::new(config)
        .unwrap()
        .run(ScriptSource::open(&trace_path).unwrap())
        .unwrap();

    assert!(report.is_race_free());
    assert_eq!(report.events_skipped, 2);
    assert_eq!(report.metrics.events_applied, 6);
}

#[test]
fn default_file_round_trips_through_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    SessionConfig::write_default_if_missing(&path).unwrap();

    let config = SessionConfig::from_file_or_default(&path).unwrap();
    let report = Session::new(config)
        .unwrap()
        .run(ScriptSource::from_text(UNSYNCHRONIZED))
        .unwrap();
    assert_eq!(report.violations.len(), 2);
}

#[test]
fn rejected_untracked_access_is_an_error() {
    let err = run_script(SessionConfig::default(), "rd(0,x)\n").unwrap_err();
    assert!(matches!(err, RaceError::UnknownLocation { .. }));
    assert!(err.is_unknown_entity());
}

#[test]
fn watched_entity_declared_again_by_trace_is_an_error() {
    let mut config = threads(1);
    config.watch_locations = vec!["x".to_string()];
    let err = run_script(config, UNSYNCHRONIZED).unwrap_err();
    assert!(matches!(err, RaceError::AlreadyRegistered { .. }));
}
