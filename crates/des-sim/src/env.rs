//! The `Environment` struct and its stepping loop.

use std::fmt;

use des_core::{DesError, DesResult, EventId, ProcessId, ResourceId, SimConfig, SimTime};
use des_resource::{Resource, ResourcePool};
use des_schedule::{Event, Payload, Priority};
use tracing::{debug, error, info, trace, warn};

use crate::kernel::Kernel;
use crate::{
    Context, Process, ProcessError, ProcessHandle, ProcessState, Resume, SimError, SimObserver,
    SimResult, Step,
};

// ── EnvState ──────────────────────────────────────────────────────────────────

/// Lifecycle of an [`Environment`].
///
/// ```text
/// Idle ──run*──▶ Running ──▶ Completed   (queue drained)
///                        ──▶ Limited     (time or event bound hit; may run again)
///                        ──▶ Failed      (a process failed)
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EnvState {
    Idle,
    Running,
    Completed,
    Limited,
    Failed,
}

impl EnvState {
    /// `Completed` and `Failed` accept no further run calls.
    pub fn is_terminal(self) -> bool {
        matches!(self, EnvState::Completed | EnvState::Failed)
    }
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnvState::Idle      => "idle",
            EnvState::Running   => "running",
            EnvState::Completed => "completed",
            EnvState::Limited   => "limited",
            EnvState::Failed    => "failed",
        };
        f.write_str(s)
    }
}

/// Stop condition of one run call.
#[derive(Copy, Clone, Debug)]
enum Stop {
    Drained,
    Time(SimTime),
    Event(EventId),
}

// ── Environment ───────────────────────────────────────────────────────────────

/// The simulation engine: clock, event queue, resources and processes of one
/// run.
///
/// `M` is the caller-owned model value handed to every process resumption.
/// The environment borrows it for the duration of a run call only, so the
/// caller can inspect it between calls.
///
/// Processing an event:
///
/// 1. Pop the earliest event and move the clock to its time.
/// 2. Report it to [`SimObserver::on_event`].
/// 3. Resume every process waiting on it, in the order they started waiting.
///    An interrupt instead detaches its target from whatever it waits on and
///    resumes it with the cause.
/// 4. Each resumed process parks on a new event, finishes (its exit event is
///    scheduled at the current time) or fails.  The first failure ends the
///    run with [`SimError::ProcessFailure`].
///
/// Create with [`Environment::new`] or
/// [`EnvironmentBuilder`][crate::EnvironmentBuilder].
pub struct Environment<M> {
    kernel:    Kernel<M>,
    config:    SimConfig,
    state:     EnvState,
    processed: u64,
}

impl<M: 'static> Environment<M> {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            kernel: Kernel::new(config.make_clock(), config.seed),
            config,
            state: EnvState::Idle,
            processed: 0,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.now()
    }

    #[inline]
    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Events processed so far, over all run calls.
    pub fn events_processed(&self) -> u64 {
        self.processed
    }

    /// Time of the next queued event, or `None` if the queue is empty.
    pub fn peek(&self) -> Option<SimTime> {
        self.kernel.queue.next_time()
    }

    /// Number of queued events.
    pub fn pending_events(&self) -> usize {
        self.kernel.queue.len()
    }

    pub fn resource(&self, id: ResourceId) -> DesResult<&Resource> {
        self.kernel.resources.get(id)
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.kernel.resources
    }

    pub fn process_count(&self) -> usize {
        self.kernel.processes.len()
    }

    pub fn process_state(&self, process: ProcessId) -> DesResult<ProcessState> {
        self.kernel.slot(process).map(|slot| slot.state)
    }

    pub fn process_name(&self, process: ProcessId) -> DesResult<&str> {
        self.kernel.slot(process).map(|slot| slot.name.as_str())
    }

    // ── Setup ─────────────────────────────────────────────────────────────

    /// Register a process.  Its first resumption is an urgent event at
    /// `now()`, so it starts before anything else scheduled for that time.
    pub fn process<P: Process<M>>(&mut self, process: P) -> SimResult<ProcessHandle> {
        self.spawn_boxed(Box::new(process))
    }

    pub(crate) fn spawn_boxed(&mut self, process: Box<dyn Process<M>>) -> SimResult<ProcessHandle> {
        self.ensure_runnable()?;
        Ok(self.kernel.spawn(process)?)
    }

    /// Create a resource with `capacity` slots.
    pub fn add_resource(&mut self, capacity: usize) -> DesResult<ResourceId> {
        self.kernel.add_resource(capacity)
    }

    /// An event `delay` time units from now, e.g. as a bound for
    /// [`run_until_event`][Self::run_until_event].
    pub fn timeout(&mut self, delay: f64) -> DesResult<EventId> {
        self.kernel.timeout(delay, Priority::NORMAL)
    }

    /// Raise `cause` into `process` at the current time.
    pub fn interrupt(&mut self, process: ProcessId, cause: impl Into<String>) -> DesResult<()> {
        self.kernel.interrupt(process, cause.into())
    }

    /// Terminate `process` immediately.
    ///
    /// Its pending wake-up is dropped, queued requests are withdrawn, granted
    /// slots are released (granting them to the next waiters) and its exit
    /// event is scheduled at the current time.
    pub fn cancel(&mut self, process: ProcessId) -> DesResult<()> {
        self.kernel.cancel(process)
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Process events until the queue is empty.
    pub fn run<O: SimObserver>(&mut self, model: &mut M, observer: &mut O) -> SimResult<EnvState> {
        self.run_loop(Stop::Drained, model, observer)
    }

    /// Process every event strictly before `until`, then set the clock to
    /// `until`.
    ///
    /// Events at exactly `until` stay queued for the next call.  If the queue
    /// drains first the run is `Completed` and the clock stays at the last
    /// processed event.
    pub fn run_until<O: SimObserver>(
        &mut self,
        until:    f64,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<EnvState> {
        self.ensure_runnable()?;
        let now = self.now();
        if !until.is_finite() || SimTime(until) < now {
            return Err(SimError::InvalidUntil { until, now });
        }
        self.run_loop(Stop::Time(SimTime(until)), model, observer)
    }

    /// Process events until `event` itself has been processed.
    ///
    /// Fails with [`DesError::UnknownEvent`] if `event` is not pending, and
    /// with [`SimError::UntilEventNotTriggered`] if the queue drains before
    /// it fires.
    pub fn run_until_event<O: SimObserver>(
        &mut self,
        event:    EventId,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<EnvState> {
        self.ensure_runnable()?;
        if !self.kernel.pending.contains(&event) {
            return Err(DesError::UnknownEvent(event).into());
        }
        self.run_loop(Stop::Event(event), model, observer)
    }

    /// Process exactly one event.
    ///
    /// Returns the time of the processed event, or `None` if the queue was
    /// empty.  A successful step leaves the environment `Limited`.
    pub fn step<O: SimObserver>(
        &mut self,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<Option<SimTime>> {
        self.ensure_runnable()?;
        let Some(event) = self.kernel.queue.pop() else {
            return Ok(None);
        };
        let at = event.time();
        self.state = EnvState::Running;
        match self.process_event(event, model, observer) {
            Ok(()) => {
                self.state = EnvState::Limited;
                Ok(Some(at))
            }
            Err(err) => {
                self.state = EnvState::Failed;
                Err(err)
            }
        }
    }

    fn ensure_runnable(&self) -> SimResult<()> {
        if self.state.is_terminal() {
            return Err(SimError::Terminal(self.state));
        }
        Ok(())
    }

    fn run_loop<O: SimObserver>(
        &mut self,
        stop:     Stop,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<EnvState> {
        self.ensure_runnable()?;
        self.state = EnvState::Running;
        let start = self.processed;

        let outcome = self.drive(stop, model, observer);
        self.state = match &outcome {
            Ok(state) => *state,
            Err(SimError::UntilEventNotTriggered(_)) => EnvState::Completed,
            Err(_) => EnvState::Failed,
        };

        let now = self.now();
        observer.on_run_end(now, self.state);
        info!(%now, state = %self.state, events = self.processed - start, "run ended");
        outcome
    }

    fn drive<O: SimObserver>(
        &mut self,
        stop:     Stop,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<EnvState> {
        loop {
            let Some(next) = self.kernel.queue.next_time() else {
                return match stop {
                    Stop::Event(id) => Err(SimError::UntilEventNotTriggered(id)),
                    Stop::Drained | Stop::Time(_) => Ok(EnvState::Completed),
                };
            };
            if let Stop::Time(bound) = stop {
                if next >= bound {
                    self.kernel.clock.advance_to(bound);
                    return Ok(EnvState::Limited);
                }
            }

            let Some(event) = self.kernel.queue.pop() else { continue };
            let id = event.id;
            self.process_event(event, model, observer)?;

            if let Stop::Event(target) = stop {
                if id == target {
                    return Ok(EnvState::Limited);
                }
            }
        }
    }

    // ── Event processing ──────────────────────────────────────────────────

    fn process_event<O: SimObserver>(
        &mut self,
        event:    Event,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<()> {
        self.kernel.clock.advance_to(event.time());
        self.kernel.pending.remove(&event.id);
        self.processed += 1;
        debug!(%event, "dispatch");
        observer.on_event(&event);

        let signal = match event.payload {
            Payload::Init(_) => Resume::Init,
            Payload::Timeout => Resume::Timeout,
            Payload::Exit(process) => Resume::Exited(process),
            Payload::Grant { resource, request } => match self.kernel.granted(resource, request) {
                Some(request) => Resume::Granted(request),
                None => {
                    let stranded = self.kernel.waiters.remove(&event.id).unwrap_or_default();
                    for &process in &stranded {
                        self.kernel.slot_mut(process)?.waiting_on = None;
                    }
                    warn!(%resource, %request, stranded = stranded.len(), "grant no longer held, waiters dropped");
                    return Ok(());
                }
            },
            Payload::Interrupt { process, cause } => {
                return self.deliver_interrupt(process, cause, model, observer);
            }
        };

        let waiters = self.kernel.waiters.remove(&event.id).unwrap_or_default();
        for process in waiters {
            // An earlier waiter may have cancelled this one.
            let slot = self.kernel.slot_mut(process)?;
            if slot.waiting_on != Some(event.id) {
                continue;
            }
            slot.waiting_on = None;
            self.resume(process, signal.clone(), model, observer)?;
        }
        Ok(())
    }

    fn deliver_interrupt<O: SimObserver>(
        &mut self,
        process:  ProcessId,
        cause:    String,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<()> {
        if !self.kernel.is_alive(process) {
            debug!(%process, "interrupt target already terminated");
            return Ok(());
        }
        // The old wait target stays queued; it just no longer resumes `process`.
        self.kernel.detach(process);
        self.resume(process, Resume::Interrupted(cause), model, observer)
    }

    fn resume<O: SimObserver>(
        &mut self,
        process:  ProcessId,
        signal:   Resume,
        model:    &mut M,
        observer: &mut O,
    ) -> SimResult<()> {
        let now = self.now();
        let slot = self.kernel.slot_mut(process)?;
        let Some(mut body) = slot.body.take() else {
            return Ok(());
        };
        slot.state = ProcessState::Running;

        observer.on_resume(now, process, &signal);
        trace!(%process, %now, ?signal, "resume");

        let outcome = {
            let mut ctx = Context::new(&mut self.kernel, process);
            body.resume(&mut ctx, model, signal)
        };

        match outcome {
            Ok(Step::Wait(event)) => {
                self.kernel.slot_mut(process)?.body = Some(body);
                if let Err(err) = self.kernel.park(process, event) {
                    return Err(self.fail(process, err.into(), observer));
                }
                Ok(())
            }
            Ok(Step::Done) => {
                self.kernel.finish(process, ProcessState::Finished)?;
                debug!(%process, %now, "process finished");
                observer.on_exit(now, process, ProcessState::Finished);
                Ok(())
            }
            Err(err) => Err(self.fail(process, err, observer)),
        }
    }

    fn fail<O: SimObserver>(
        &mut self,
        process:  ProcessId,
        source:   ProcessError,
        observer: &mut O,
    ) -> SimError {
        let now = self.now();
        let mut name = String::new();
        if let Ok(slot) = self.kernel.slot_mut(process) {
            slot.state = ProcessState::Failed;
            slot.body = None;
            slot.waiting_on = None;
            name.clone_from(&slot.name);
        }
        match self.kernel.free_slots(process) {
            Ok((0, 0)) => {}
            Ok((withdrawn, released)) => {
                debug!(%process, withdrawn, released, "slots of failed process freed");
            }
            Err(err) => warn!(%process, error = %err, "slots of failed process not freed"),
        }
        error!(%process, name = %name, %now, error = %source, "process failed");
        observer.on_exit(now, process, ProcessState::Failed);
        SimError::ProcessFailure { process, name, source }
    }
}
