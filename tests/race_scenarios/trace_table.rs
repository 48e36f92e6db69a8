//! Trace table output for whole sessions

use crate::common::*;

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[test]
fn unsynchronized_table() {
    let (_, table) = run_with_table(threads(2), UNSYNCHRONIZED);
    assert_eq!(
        lines(&table),
        vec![
            "C0\tC1\tRx\tWx\tLm",
            "<1,0>\t<0,1>\t<0,0>\t<0,0>\t<0,0>",
            "rd(0,x)",
            "<1,0>\t<0,1>\t<1,0>\t<0,0>\t<0,0>",
            "rd(1,x)",
            "<1,0>\t<0,1>\t<1,1>\t<0,0>\t<0,0>",
            "wr(0,x)",
            "race condition detected: wr(0,x)",
            "<1,0>\t<0,1>\t<1,1>\t<1,0>\t<0,0>",
            "wr(1,x)",
            "race condition detected: wr(1,x)",
            "<1,0>\t<0,1>\t<1,1>\t<1,1>\t<0,0>",
        ]
    );
}

#[test]
fn lock_protected_table() {
    let (_, table) = run_with_table(threads(2), LOCK_PROTECTED);
    assert_eq!(
        lines(&table),
        vec![
            "C0\tC1\tRx\tWx\tLm",
            "<1,0>\t<0,1>\t<0,0>\t<0,0>\t<0,0>",
            "acq(0,m)",
            "<1,0>\t<0,1>\t<0,0>\t<0,0>\t<0,0>",
            "rd(0,x)",
            "<1,0>\t<0,1>\t<1,0>\t<0,0>\t<0,0>",
            "wr(0,x)",
            "<1,0>\t<0,1>\t<1,0>\t<1,0>\t<0,0>",
            "rel(0,m)",
            "<2,0>\t<0,1>\t<1,0>\t<1,0>\t<2,0>",
            "acq(1,m)",
            "<2,0>\t<2,1>\t<1,0>\t<1,0>\t<2,0>",
            "rd(1,x)",
            "<2,0>\t<2,1>\t<1,1>\t<1,0>\t<2,0>",
            "wr(1,x)",
            "<2,0>\t<2,1>\t<1,1>\t<1,1>\t<2,0>",
            "rel(1,m)",
            "<2,0>\t<2,2>\t<1,1>\t<1,1>\t<2,2>",
        ]
    );
}

#[test]
fn forked_thread_extends_columns() {
    let (_, table) = run_with_table(threads(1), FORK_JOIN);
    assert_eq!(
        lines(&table),
        vec![
            "C0\tRx\tWx",
            "<1>\t<0>\t<0>",
            "fork(0,7)",
            "C0\tC1\tRx\tWx",
            "<2,0>\t<1,1>\t<0,0>\t<0,0>",
            "wr(1,x)",
            "<2,0>\t<1,1>\t<0,0>\t<0,1>",
            "join(0,7)",
            "<2,1>\t<1,2>\t<0,0>\t<0,1>",
            "rd(0,x)",
            "<2,1>\t<1,2>\t<2,0>\t<0,1>",
        ]
    );
}

#[test]
fn mid_trace_registration_extends_columns() {
    let (_, table) = run_with_table(threads(1), "var x\nwr(0,x)\nvar y\nrd(0,y)\n");
    assert_eq!(
        lines(&table),
        vec![
            "C0\tRx\tWx",
            "<1>\t<0>\t<0>",
            "wr(0,x)",
            "<1>\t<0>\t<1>",
            "rd(0,y)",
            "C0\tRx\tWx\tRy\tWy",
            "<1>\t<0>\t<1>\t<1>\t<0>",
        ]
    );
}
