//! Identical traces give identical reports

use crate::common::*;
use proptest::prelude::*;
use racetrace::{ScriptSource, Session, SharedBuffer, TraceTable};

/// Table output up to the end of the trace or the first error
fn table_text(script: &str) -> String {
    let buffer = SharedBuffer::new();
    let mut session = Session::new(threads(3)).unwrap();
    session.add_sink(TraceTable::new(buffer.clone()));
    let _ = session.run(ScriptSource::from_text(script));
    buffer.contents()
}

fn arb_line() -> impl Strategy<Value = String> {
    (0u8..6, 0u32..3, 0usize..2, 0u64..3).prop_map(|(op, thread, target, handle)| {
        let location = ["x", "y"][target];
        let lock = ["m", "n"][target];
        match op {
            0 => format!("rd({},{})", thread, location),
            1 => format!("wr({},{})", thread, location),
            2 => format!("acq({},{})", thread, lock),
            3 => format!("rel({},{})", thread, lock),
            4 => format!("fork({},{})", thread, handle),
            _ => format!("join({},{})", thread, handle),
        }
    })
}

fn arb_script() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_line(), 0..30)
        .prop_map(|lines| format!("var x\nvar y\nlock m\nlock n\n{}\n", lines.join("\n")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reports_are_reproducible(script in arb_script()) {
        let first = run_script(threads(3), &script);
        let second = run_script(threads(3), &script);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "runs disagreed on success"),
        }
    }

    #[test]
    fn trace_tables_are_reproducible(script in arb_script()) {
        prop_assert_eq!(table_text(&script), table_text(&script));
    }
}
