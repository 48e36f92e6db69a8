//! Event sources
//!
//! A source yields [`TraceRecord`]s in program order. Two are provided:
//! - [`ScriptSource`]: a line-oriented text trace
//! - [`RecordSource`]: an in-memory list of records
//!
//! ## Script format
//!
//! ```text
//! # comment
//! var x        # register location x
//! lock m       # register lock m
//! rd(0,x)
//! wr(0,x)
//! acq(0,m)
//! rel(0,m)
//! fork(0,7)    # 7 is the thread handle
//! join(0,7)
//! ```

use racetrace_core::{
    Event, Location, Lock, RaceError, RaceResult, Registration, ThreadHandle, ThreadId,
    TraceRecord,
};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Produces trace records in the order the traced program executed them
pub trait EventSource {
    /// Next record, or `None` once the trace is exhausted
    fn next_record(&mut self) -> RaceResult<Option<TraceRecord>>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_record(&mut self) -> RaceResult<Option<TraceRecord>> {
        (**self).next_record()
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_record(&mut self) -> RaceResult<Option<TraceRecord>> {
        (**self).next_record()
    }
}

// ============================================================================
// RecordSource
// ============================================================================

/// Replays records held in memory
#[derive(Debug, Clone, Default)]
pub struct RecordSource {
    records: VecDeque<TraceRecord>,
}

impl RecordSource {
    /// Replay `records` in order
    pub fn new(records: impl IntoIterator<Item = TraceRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Replay `events` after registering `locations` and `locks`
    pub fn with_registrations(
        locations: impl IntoIterator<Item = Location>,
        locks: impl IntoIterator<Item = Lock>,
        events: impl IntoIterator<Item = Event>,
    ) -> Self {
        let records = locations
            .into_iter()
            .map(Registration::Location)
            .chain(locks.into_iter().map(Registration::Lock))
            .map(TraceRecord::Register)
            .chain(events.into_iter().map(TraceRecord::Event));
        Self::new(records)
    }

    /// Records not yet replayed
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl From<Vec<TraceRecord>> for RecordSource {
    fn from(records: Vec<TraceRecord>) -> Self {
        Self::new(records)
    }
}

impl EventSource for RecordSource {
    fn next_record(&mut self) -> RaceResult<Option<TraceRecord>> {
        Ok(self.records.pop_front())
    }
}

// ============================================================================
// ScriptSource
// ============================================================================

/// Reads a text trace one line at a time
#[derive(Debug)]
pub struct ScriptSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> ScriptSource<R> {
    /// Read the script from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// 1-based number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }
}

impl ScriptSource<Cursor<String>> {
    /// Read the script from an in-memory string
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Cursor::new(text.into()))
    }
}

impl ScriptSource<BufReader<File>> {
    /// Open the script at `path`
    pub fn open(path: impl AsRef<Path>) -> RaceResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventSource for ScriptSource<R> {
    fn next_record(&mut self) -> RaceResult<Option<TraceRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if let Some(record) = parse_line(&self.buf, self.line)? {
                return Ok(Some(record));
            }
        }
    }
}

/// Parse a whole script into records
pub fn parse_script(text: &str) -> RaceResult<Vec<TraceRecord>> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(record) = parse_line(line, index + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse one script line; `Ok(None)` for blank and comment-only lines
///
/// # Errors
/// `Parse` carrying `line_no` if the line is malformed.
pub fn parse_line(line: &str, line_no: usize) -> RaceResult<Option<TraceRecord>> {
    let text = match line.find('#') {
        Some(start) => &line[..start],
        None => line,
    }
    .trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(name) = declaration(text, "var") {
        let name = entity_name(name, line_no)?;
        return Ok(Some(Registration::Location(Location::new(name)).into()));
    }
    if let Some(name) = declaration(text, "lock") {
        let name = entity_name(name, line_no)?;
        return Ok(Some(Registration::Lock(Lock::new(name)).into()));
    }

    parse_event(text, line_no).map(|event| Some(event.into()))
}

/// `keyword <rest>` with at least one whitespace character between them
fn declaration<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

fn parse_event(text: &str, line_no: usize) -> RaceResult<Event> {
    let (op, args) = text
        .split_once('(')
        .ok_or_else(|| RaceError::parse(line_no, format!("expected an event, found '{}'", text)))?;
    let args = args
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| RaceError::parse(line_no, "missing closing ')'"))?;

    let mut parts = args.split(',').map(str::trim);
    let (thread, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(thread), Some(target), None) => (thread, target),
        _ => {
            return Err(RaceError::parse(
                line_no,
                format!("expected two arguments, found '{}'", args.trim()),
            ))
        }
    };
    let thread = thread_id(thread, line_no)?;

    let event = match op.trim() {
        "rd" => Event::read(thread, Location::new(entity_name(target, line_no)?)),
        "wr" => Event::write(thread, Location::new(entity_name(target, line_no)?)),
        "acq" => Event::acquire(thread, Lock::new(entity_name(target, line_no)?)),
        "rel" => Event::release(thread, Lock::new(entity_name(target, line_no)?)),
        "fork" => Event::fork(thread, thread_handle(target, line_no)?),
        "join" => Event::join(thread, thread_handle(target, line_no)?),
        other => {
            return Err(RaceError::parse(
                line_no,
                format!("unknown operation '{}'", other),
            ))
        }
    };
    Ok(event)
}

fn thread_id(text: &str, line_no: usize) -> RaceResult<ThreadId> {
    text.parse::<u32>()
        .map(ThreadId::new)
        .map_err(|_| RaceError::parse(line_no, format!("invalid thread id '{}'", text)))
}

fn thread_handle(text: &str, line_no: usize) -> RaceResult<ThreadHandle> {
    text.parse::<u64>()
        .map(ThreadHandle::new)
        .map_err(|_| RaceError::parse(line_no, format!("invalid thread handle '{}'", text)))
}

fn entity_name(text: &str, line_no: usize) -> RaceResult<&str> {
    let valid = !text.is_empty()
        && !text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ','));
    if valid {
        Ok(text)
    } else {
        Err(RaceError::parse(line_no, format!("invalid name '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut source: impl EventSource) -> RaceResult<Vec<TraceRecord>> {
        let mut records = Vec::new();
        while let Some(record) = source.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    #[test]
    fn test_parse_every_form() {
        let records = parse_script(
            "var x\nlock m\nrd(0,x)\nwr(1,x)\nacq(0,m)\nrel(0,m)\nfork(0,7)\njoin(0,7)\n",
        )
        .unwrap();
        let expected: Vec<TraceRecord> = vec![
            Registration::Location(Location::new("x")).into(),
            Registration::Lock(Lock::new("m")).into(),
            Event::read(0, "x").into(),
            Event::write(1, "x").into(),
            Event::acquire(0, "m").into(),
            Event::release(0, "m").into(),
            Event::fork(0, 7u64).into(),
            Event::join(0, 7u64).into(),
        ];
        assert_eq!(records, expected);
    }

    #[test]
    fn test_comments_blanks_and_whitespace() {
        let records = parse_script("# header\n\n   \nrd ( 3 , counter )  # trailing\n").unwrap();
        assert_eq!(records, vec![TraceRecord::from(Event::read(3, "counter"))]);
    }

    #[test]
    fn test_errors_carry_line_number() {
        let err = parse_script("var x\n\nrd(0 x)\n").unwrap_err();
        match err {
            RaceError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_malformed_lines() {
        for bad in [
            "frob(0,x)",
            "rd(0,x",
            "rd(0)",
            "rd(0,x,y)",
            "rd(a,x)",
            "rd(-1,x)",
            "fork(0,h)",
            "rd(0,)",
            "var",
            "var a b",
            "hello",
        ] {
            assert!(
                matches!(parse_line(bad, 1), Err(RaceError::Parse { line: 1, .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_keyword_prefix_is_not_a_declaration() {
        // `variable` is not `var iable`
        assert!(parse_line("variable", 1).is_err());
        assert!(parse_line("locks", 1).is_err());
    }

    #[test]
    fn test_script_source_matches_parse_script() {
        let text = "var x\n# c\nrd(0,x)\nwr(0,x)\n";
        let streamed = collect(ScriptSource::from_text(text)).unwrap();
        assert_eq!(streamed, parse_script(text).unwrap());
    }

    #[test]
    fn test_script_source_tracks_lines() {
        let mut source = ScriptSource::from_text("\n\nvar x\nbogus\n");
        source.next_record().unwrap();
        assert_eq!(source.line(), 3);
        let err = source.next_record().unwrap_err();
        assert!(matches!(err, RaceError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_script_source_missing_file() {
        let err = ScriptSource::open("/nonexistent/trace.rt").unwrap_err();
        assert!(matches!(err, RaceError::Io(_)));
    }

    #[test]
    fn test_record_source_replays_in_order() {
        let mut source = RecordSource::with_registrations(
            [Location::new("x")],
            [Lock::new("m")],
            [Event::acquire(0, "m"), Event::write(0, "x")],
        );
        assert_eq!(source.remaining(), 4);
        let records = collect(&mut source).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3], TraceRecord::from(Event::write(0, "x")));
        assert!(source.next_record().unwrap().is_none());
    }
}
