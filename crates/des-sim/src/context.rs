//! The handle a process uses to talk to the engine while it is resumed.

use des_core::{DesError, DesResult, EventId, ProcessId, ResourceId, SimTime};
use des_resource::{Request, Resource};
use des_schedule::Priority;

use crate::kernel::Kernel;
use crate::{Process, ProcessHandle, ProcessState};

/// Engine access for the process currently being resumed.
///
/// A `Context` exists only for the duration of one
/// [`Process::resume`][crate::Process::resume] call.  Everything it schedules
/// is stamped with the current time; nothing it does advances the clock.
pub struct Context<'k, M> {
    kernel:  &'k mut Kernel<M>,
    current: ProcessId,
}

impl<'k, M: 'static> Context<'k, M> {
    pub(crate) fn new(kernel: &'k mut Kernel<M>, current: ProcessId) -> Self {
        Self { kernel, current }
    }

    /// Current simulation time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.now()
    }

    /// ID of the process being resumed.
    #[inline]
    pub fn current(&self) -> ProcessId {
        self.current
    }

    /// The run's master seed, for deriving a [`ProcessRng`][des_core::ProcessRng].
    #[inline]
    pub fn seed(&self) -> u64 {
        self.kernel.seed
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// An event that fires `delay` time units from now.
    ///
    /// Fails with [`DesError::InvalidDelay`] for negative or non-finite
    /// delays; nothing is scheduled in that case.
    pub fn timeout(&mut self, delay: f64) -> DesResult<EventId> {
        self.kernel.timeout(delay, Priority::NORMAL)
    }

    /// Like [`timeout`][Self::timeout] with an explicit tiebreak priority.
    pub fn timeout_with(&mut self, delay: f64, priority: Priority) -> DesResult<EventId> {
        self.kernel.timeout(delay, priority)
    }

    /// Start another process at the current time.
    pub fn spawn<P: Process<M>>(&mut self, process: P) -> DesResult<ProcessHandle> {
        self.kernel.spawn(Box::new(process))
    }

    // ── Resources ─────────────────────────────────────────────────────────

    /// Ask `resource` for a slot.  Wait on `request.event` to be resumed with
    /// [`Resume::Granted`][crate::Resume::Granted] once the slot is yours.
    pub fn request(&mut self, resource: ResourceId) -> DesResult<Request> {
        self.kernel.request(self.current, resource)
    }

    /// Give back a granted slot.  The next queued request, if any, is granted
    /// at the current time.
    ///
    /// Fails with [`DesError::GrantUndelivered`] while some process is still
    /// parked on the grant of `request`.
    pub fn release(&mut self, request: &Request) -> DesResult<()> {
        self.kernel.release(request)
    }

    /// Take a still-waiting request out of its queue.
    pub fn withdraw(&mut self, request: &Request) -> DesResult<()> {
        self.kernel.withdraw(request)
    }

    /// Release `request` if granted, withdraw it if still queued.
    pub fn relinquish(&mut self, request: &Request) -> DesResult<()> {
        self.kernel.relinquish(request)
    }

    pub fn resource(&self, id: ResourceId) -> DesResult<&Resource> {
        self.kernel.resources.get(id)
    }

    // ── Other processes ───────────────────────────────────────────────────

    /// Raise `cause` into `process` at the current time.
    ///
    /// The target stops waiting on whatever it waited on and is resumed with
    /// [`Resume::Interrupted`][crate::Resume::Interrupted].
    pub fn interrupt(&mut self, process: ProcessId, cause: impl Into<String>) -> DesResult<()> {
        if process == self.current {
            return Err(DesError::InvalidTarget { process, reason: "a process cannot interrupt itself" });
        }
        self.kernel.interrupt(process, cause.into())
    }

    /// Terminate `process` now.  See [`Environment::cancel`][crate::Environment::cancel].
    pub fn cancel(&mut self, process: ProcessId) -> DesResult<()> {
        if process == self.current {
            return Err(DesError::InvalidTarget { process, reason: "a process cannot cancel itself" });
        }
        self.kernel.cancel(process)
    }

    pub fn process_state(&self, process: ProcessId) -> DesResult<ProcessState> {
        self.kernel.slot(process).map(|slot| slot.state)
    }

    /// Exit event of `process`, for waiting on its completion.
    pub fn exit_event(&self, process: ProcessId) -> DesResult<EventId> {
        self.kernel.slot(process).map(|slot| slot.exit)
    }
}
