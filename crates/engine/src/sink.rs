//! Trace sinks
//!
//! Sinks observe a session as it runs. For each applied event the session
//! first reports the race it exposed, if any, then the event itself with the
//! clock table as it stands afterwards.

use parking_lot::Mutex;
use racetrace_concurrency::{ClockTable, Violation};
use racetrace_core::{Event, Location, Lock, RaceResult, ThreadId, VectorClock};
use std::io::{self, Write};
use std::sync::Arc;

/// Observes a running session
pub trait TraceSink {
    /// Called once, before the first event is applied
    fn on_start(&mut self, _clocks: &ClockTable) -> RaceResult<()> {
        Ok(())
    }

    /// Called after `event` was applied
    fn on_event(&mut self, _event: &Event, _clocks: &ClockTable) -> RaceResult<()> {
        Ok(())
    }

    /// Called when the event about to be reported raced
    fn on_violation(&mut self, _violation: &Violation) -> RaceResult<()> {
        Ok(())
    }
}

/// In-memory output that stays readable after a sink takes ownership of it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// TraceTable
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Columns {
    threads: Vec<ThreadId>,
    locations: Vec<Location>,
    locks: Vec<Lock>,
}

impl Columns {
    fn of(clocks: &ClockTable) -> Self {
        Self {
            threads: clocks.thread_ids(),
            locations: clocks.locations().to_vec(),
            locks: clocks.locks().to_vec(),
        }
    }

    fn header(&self) -> String {
        let threads = self.threads.iter().map(|t| format!("C{}", t.get()));
        let locations = self
            .locations
            .iter()
            .flat_map(|x| [format!("R{}", x), format!("W{}", x)]);
        let locks = self.locks.iter().map(|m| format!("L{}", m));
        threads.chain(locations).chain(locks).collect::<Vec<_>>().join("\t")
    }

    fn row(&self, clocks: &ClockTable) -> String {
        let dense = |clock: Option<&VectorClock>| {
            clock
                .map(|c| c.render_dense(&self.threads))
                .unwrap_or_else(|| VectorClock::new().render_dense(&self.threads))
        };
        let threads = self.threads.iter().map(|&t| dense(clocks.thread_clock(t)));
        let locations = self.locations.iter().flat_map(|x| {
            [
                dense(clocks.read_clock(x).ok()),
                dense(clocks.write_clock(x).ok()),
            ]
        });
        let locks = self.locks.iter().map(|m| dense(clocks.lock_clock(m).ok()));
        threads.chain(locations).chain(locks).collect::<Vec<_>>().join("\t")
    }
}

/// Renders every clock after every event
///
/// ```text
/// C0      C1      Rx      Wx      Lm
/// <1,0>   <0,1>   <0,0>   <0,0>   <0,0>
/// wr(0,x)
/// <1,0>   <0,1>   <0,0>   <1,0>   <0,0>
/// ```
///
/// Clocks are rendered densely over the thread columns. When a thread,
/// location or lock first appears the header is printed again with the
/// extended column set.
#[derive(Debug)]
pub struct TraceTable<W> {
    out: W,
    columns: Option<Columns>,
    pending: Vec<String>,
}

impl<W: Write> TraceTable<W> {
    /// Write the table to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: None,
            pending: Vec::new(),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header_if_changed(&mut self, clocks: &ClockTable) -> io::Result<()> {
        let columns = Columns::of(clocks);
        if self.columns.as_ref() != Some(&columns) {
            writeln!(self.out, "{}", columns.header())?;
            self.columns = Some(columns);
        }
        Ok(())
    }

    fn write_row(&mut self, clocks: &ClockTable) -> io::Result<()> {
        if let Some(columns) = &self.columns {
            writeln!(self.out, "{}", columns.row(clocks))?;
        }
        Ok(())
    }
}

impl<W: Write> TraceSink for TraceTable<W> {
    fn on_start(&mut self, clocks: &ClockTable) -> RaceResult<()> {
        self.write_header_if_changed(clocks)?;
        self.write_row(clocks)?;
        Ok(())
    }

    fn on_event(&mut self, event: &Event, clocks: &ClockTable) -> RaceResult<()> {
        writeln!(self.out, "{}", event)?;
        for line in self.pending.drain(..) {
            writeln!(self.out, "{}", line)?;
        }
        self.write_header_if_changed(clocks)?;
        self.write_row(clocks)?;
        Ok(())
    }

    fn on_violation(&mut self, violation: &Violation) -> RaceResult<()> {
        // printed under the event line, which arrives next
        self.pending.push(violation.to_string());
        Ok(())
    }
}

/// Writes one line per race and nothing else
#[derive(Debug)]
pub struct ViolationPrinter<W> {
    out: W,
}

impl<W: Write> ViolationPrinter<W> {
    /// Write violations to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for ViolationPrinter<W> {
    fn on_violation(&mut self, violation: &Violation) -> RaceResult<()> {
        writeln!(self.out, "{}", violation)?;
        Ok(())
    }
}
