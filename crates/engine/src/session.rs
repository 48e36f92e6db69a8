//! Session driver
//!
//! A session owns one detector, feeds it every record from a source, fans
//! each event out to the installed sinks and returns a report with the races
//! found and the final clocks.

use crate::config::{SessionConfig, UntrackedPolicy};
use crate::sink::{TraceSink, TraceTable, ViolationPrinter};
use crate::source::EventSource;
use racetrace_concurrency::{
    ClockSnapshot, Detector, DetectorMetrics, HandlerChain, TracingHandler, Violation,
    ViolationHandler,
};
use racetrace_core::{Event, RaceResult, TraceRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use tracing::{debug, warn};

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Every race, in detection order
    pub violations: Vec<Violation>,
    /// Detector counters at the end of the run
    pub metrics: DetectorMetrics,
    /// Events dropped because they named an unregistered entity
    pub events_skipped: u64,
    /// Every clock at the end of the run
    pub snapshot: ClockSnapshot,
}

impl SessionReport {
    /// True if no race was found
    pub fn is_race_free(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} events applied, {} skipped, {} races ({} read, {} write)",
            self.metrics.events_applied,
            self.events_skipped,
            self.metrics.total_violations(),
            self.metrics.read_violations,
            self.metrics.write_violations
        )?;
        for violation in &self.violations {
            writeln!(f, "{}", violation)?;
        }
        write!(f, "{}", self.snapshot)
    }
}

/// One analysis run over one trace
pub struct Session {
    detector: Detector,
    handlers: HandlerChain,
    sinks: Vec<Box<dyn TraceSink>>,
    untracked: UntrackedPolicy,
}

impl Session {
    /// Build a session from `config`
    ///
    /// Watched entities are registered immediately; the printing flags
    /// install stdout sinks.
    ///
    /// # Errors
    /// `Config` if the config is invalid.
    pub fn new(config: SessionConfig) -> RaceResult<Self> {
        config.validate()?;

        let mut detector = Detector::with_config(&config.detector);
        for name in &config.watch_locations {
            detector.register_location(name.as_str())?;
        }
        for name in &config.watch_locks {
            detector.register_lock(name.as_str())?;
        }

        let mut session = Self {
            detector,
            handlers: HandlerChain::new().with(TracingHandler),
            sinks: Vec::new(),
            untracked: config.untracked,
        };
        if config.print_trace {
            session.add_sink(TraceTable::new(io::stdout()));
        }
        if config.print_violations {
            session.add_sink(ViolationPrinter::new(io::stdout()));
        }
        Ok(session)
    }

    /// Observe the run with `sink`
    pub fn add_sink(&mut self, sink: impl TraceSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Also report races to `handler`
    pub fn add_violation_handler(&mut self, handler: impl ViolationHandler + 'static) {
        self.handlers.push(handler);
    }

    /// The detector as configured so far
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Apply every record from `source`
    ///
    /// # Errors
    /// The first source or usage error; the run stops there.
    pub fn run(mut self, mut source: impl EventSource) -> RaceResult<SessionReport> {
        let handlers = std::mem::take(&mut self.handlers);
        self.detector.set_violation_handler(handlers);
        debug!(
            target: "racetrace::session",
            locations = self.detector.locations().len(),
            locks = self.detector.locks().len(),
            sinks = self.sinks.len(),
            "Session started"
        );

        let mut started = false;
        let mut violations = Vec::new();
        let mut events_skipped = 0u64;

        while let Some(record) = source.next_record()? {
            let event = match record {
                TraceRecord::Register(registration) => {
                    self.detector.register(&registration)?;
                    continue;
                }
                TraceRecord::Event(event) => event,
            };

            if !started {
                self.start()?;
                started = true;
            }
            if self.should_skip(&event) {
                warn!(
                    target: "racetrace::session",
                    event = %event,
                    "Skipping event on untracked entity"
                );
                events_skipped += 1;
                continue;
            }

            if let Some(violation) = self.detector.apply(&event)? {
                for sink in &mut self.sinks {
                    sink.on_violation(&violation)?;
                }
                violations.push(violation);
            }
            for sink in &mut self.sinks {
                sink.on_event(&event, self.detector.clocks())?;
            }
        }
        if !started {
            self.start()?;
        }

        let report = SessionReport {
            violations,
            metrics: self.detector.metrics(),
            events_skipped,
            snapshot: self.detector.snapshot(),
        };
        debug!(
            target: "racetrace::session",
            events = report.metrics.events_applied,
            skipped = report.events_skipped,
            races = report.violations.len(),
            threads = report.metrics.threads,
            "Session finished"
        );
        Ok(report)
    }

    fn start(&mut self) -> RaceResult<()> {
        for sink in &mut self.sinks {
            sink.on_start(self.detector.clocks())?;
        }
        Ok(())
    }

    fn should_skip(&self, event: &Event) -> bool {
        if self.untracked == UntrackedPolicy::Reject {
            return false;
        }
        let clocks = self.detector.clocks();
        let untracked_location = event
            .location()
            .is_some_and(|x| !clocks.is_location_registered(x));
        let untracked_lock = event
            .lock()
            .is_some_and(|m| !clocks.is_lock_registered(m));
        untracked_location || untracked_lock
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("detector", &self.detector)
            .field("handlers", &self.handlers.len())
            .field("sinks", &self.sinks.len())
            .field("untracked", &self.untracked)
            .finish()
    }
}
