//! Environment observer trait for progress reporting and tracing.

use des_core::{EventId, ProcessId, SimTime};
use des_schedule::{Event, Priority};

use crate::{EnvState, ProcessState, Resume};

/// Callbacks invoked by the run operations of
/// [`Environment`][crate::Environment] at key points in the stepping loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: counting grants
///
/// ```rust,ignore
/// struct Grants(usize);
///
/// impl SimObserver for Grants {
///     fn on_resume(&mut self, _now: SimTime, _process: ProcessId, signal: &Resume) {
///         if matches!(signal, Resume::Granted(_)) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called right after an event is popped and the clock moved to its time,
    /// before anything is resumed.
    fn on_event(&mut self, _event: &Event) {}

    /// Called before each process resumption.
    fn on_resume(&mut self, _now: SimTime, _process: ProcessId, _signal: &Resume) {}

    /// Called when a process finishes or fails.  Cancellations happen outside
    /// the stepping loop and are not reported here.
    fn on_exit(&mut self, _now: SimTime, _process: ProcessId, _state: ProcessState) {}

    /// Called once when a run operation returns, whatever the outcome.
    fn on_run_end(&mut self, _now: SimTime, _state: EnvState) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

// ── EventTrace ────────────────────────────────────────────────────────────────

/// One processed event.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    pub time:     SimTime,
    pub priority: Priority,
    pub seq:      u64,
    pub id:       EventId,
    pub kind:     &'static str,
}

/// Records every processed event in order.
///
/// Two runs with the same model and seed produce equal traces.
#[derive(Clone, Debug, Default)]
pub struct EventTrace {
    pub records: Vec<TraceRecord>,
}

impl EventTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processed event times, in processing order.
    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.time.as_f64()).collect()
    }
}

impl SimObserver for EventTrace {
    fn on_event(&mut self, event: &Event) {
        self.records.push(TraceRecord {
            time:     event.time(),
            priority: event.priority(),
            seq:      event.seq(),
            id:       event.id,
            kind:     event.payload.kind(),
        });
    }
}
