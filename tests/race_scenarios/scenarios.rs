//! Race reports for classic access patterns

use crate::common::*;
use racetrace::{AccessKind, Location, Lock, RaceError, ThreadId, VectorClock};

fn vc(pairs: &[(u32, u64)]) -> VectorClock {
    pairs.iter().map(|&(t, v)| (ThreadId::new(t), v)).collect()
}

#[test]
fn unsynchronized_accesses_report_both_writes() {
    let report = run_script(threads(2), UNSYNCHRONIZED).unwrap();

    assert_eq!(
        race_lines(&report),
        vec![
            "race condition detected: wr(0,x)",
            "race condition detected: wr(1,x)",
        ]
    );
    assert_eq!(report.metrics.read_violations, 0);
    assert_eq!(report.metrics.write_violations, 2);
}

#[test]
fn lock_protected_accesses_are_race_free() {
    let report = run_script(threads(2), LOCK_PROTECTED).unwrap();
    assert!(report.is_race_free());

    let x = report.snapshot.location(&Location::new("x")).unwrap();
    assert_eq!(x.read, vc(&[(0, 1), (1, 1)]));
    assert_eq!(x.write, vc(&[(0, 1), (1, 1)]));
    assert_eq!(
        report.snapshot.lock(&Lock::new("m")).unwrap().clock,
        vc(&[(0, 2), (1, 2)])
    );
}

#[test]
fn fork_join_orders_child_before_parent() {
    let report = run_script(threads(0), FORK_JOIN).unwrap();
    assert!(report.is_race_free());
    assert_eq!(report.metrics.threads, 2);
    assert_eq!(
        report.snapshot.thread_clock(ThreadId::new(0)),
        vc(&[(0, 2), (1, 1)])
    );
}

#[test]
fn same_thread_accesses_never_race() {
    let report = run_script(
        threads(1),
        "var x\nrd(0,x)\nwr(0,x)\nwr(0,x)\nrd(0,x)\nwr(0,x)\n",
    )
    .unwrap();
    assert!(report.is_race_free());
}

#[test]
fn read_of_unordered_write_is_a_read_race() {
    let report = run_script(threads(2), "var x\nwr(0,x)\nrd(1,x)\n").unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, AccessKind::Read);
    assert_eq!(report.violations[0].thread, ThreadId::new(1));
}

#[test]
fn every_racing_access_is_reported_again() {
    // no deduplication: each unordered write races anew
    let report = run_script(threads(2), "var x\nwr(0,x)\nwr(1,x)\nwr(0,x)\nwr(1,x)\n").unwrap();
    assert_eq!(report.violations.len(), 3);
}

#[test]
fn lock_hand_off_through_a_chain_of_forks() {
    let script = "\
var x
lock m
fork(0,1)
fork(0,2)
acq(1,m)
wr(1,x)
rel(1,m)
acq(2,m)
wr(2,x)
rel(2,m)
join(0,1)
join(0,2)
rd(0,x)
";
    let report = run_script(threads(0), script).unwrap();
    assert!(report.is_race_free());
    assert_eq!(report.metrics.threads, 3);
}

#[test]
fn join_without_fork_stops_the_session() {
    let err = run_script(threads(1), "var x\njoin(0,3)\n").unwrap_err();
    assert!(matches!(err, RaceError::UnknownThreadHandle { .. }));
}

#[test]
fn highest_thread_id_is_usable() {
    let report = run_script(threads(0), "var x\nrd(4294967295,x)\n").unwrap();
    assert_eq!(report.metrics.events_applied, 1);
    assert_eq!(
        report
            .snapshot
            .location(&Location::new("x"))
            .unwrap()
            .read,
        vc(&[(u32::MAX, 1)])
    );
}

#[test]
fn fork_after_highest_thread_id_stops_the_session() {
    let err = run_script(threads(1), "var x\nrd(4294967295,x)\nfork(0,9)\n").unwrap_err();
    assert!(matches!(err, RaceError::ThreadIdsExhausted { .. }));
    assert_eq!(err.error_code(), "ThreadIdsExhausted");

    let err = run_script(threads(0), "var x\nfork(4294967295,9)\n").unwrap_err();
    assert!(matches!(err, RaceError::ThreadIdsExhausted { .. }));
}

#[test]
fn registering_twice_stops_the_session() {
    let err = run_script(threads(1), "var x\nvar x\n").unwrap_err();
    assert!(matches!(err, RaceError::AlreadyRegistered { .. }));
    assert_eq!(err.to_string(), "location 'x' is already registered");
}

#[test]
fn parse_errors_name_the_line() {
    let err = run_script(threads(1), "var x\nrd(0,x)\nrd(zero,x)\n").unwrap_err();
    assert!(matches!(err, RaceError::Parse { line: 3, .. }));
}
