//! Mutable engine state shared by the stepping loop and [`Context`][crate::Context].
//!
//! Every engine call a process makes between two suspension points lands
//! here.  The stepping loop itself needs the model and the observer, so it
//! lives in [`Environment`][crate::Environment].

use des_core::{DesError, DesResult, EventId, ProcessId, RequestId, ResourceId, SimClock, SimTime};
use des_resource::{Admission, Request, ResourcePool};
use des_schedule::{EventQueue, Payload, Priority};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::{Process, ProcessHandle, ProcessState};

/// Registry entry for one process.
pub(crate) struct ProcessSlot<M> {
    pub(crate) name:       String,
    pub(crate) state:      ProcessState,
    /// `None` while the body is executing (taken out by the stepping loop)
    /// and after termination.
    pub(crate) body:       Option<Box<dyn Process<M>>>,
    pub(crate) waiting_on: Option<EventId>,
    pub(crate) exit:       EventId,
}

pub(crate) struct Kernel<M> {
    pub(crate) clock:     SimClock,
    pub(crate) queue:     EventQueue,
    pub(crate) resources: ResourcePool,
    pub(crate) processes: Vec<ProcessSlot<M>>,
    pub(crate) seed:      u64,

    /// Processes parked on each event, in the order they started waiting.
    pub(crate) waiters: FxHashMap<EventId, Vec<ProcessId>>,
    /// Events created but not yet processed: queued ones, queued resource
    /// requests, and exit events of live processes.
    pub(crate) pending: FxHashSet<EventId>,
    /// Exit event → the process it belongs to.
    exits: FxHashMap<EventId, ProcessId>,

    next_event:   EventId,
    next_request: RequestId,
}

impl<M: 'static> Kernel<M> {
    pub(crate) fn new(clock: SimClock, seed: u64) -> Self {
        Self {
            queue: EventQueue::new(clock.now),
            clock,
            resources: ResourcePool::new(),
            processes: Vec::new(),
            seed,
            waiters: FxHashMap::default(),
            pending: FxHashSet::default(),
            exits: FxHashMap::default(),
            next_event: EventId(0),
            next_request: RequestId(0),
        }
    }

    #[inline]
    pub(crate) fn now(&self) -> SimTime {
        self.clock.now
    }

    fn alloc_event(&mut self) -> EventId {
        let id = self.next_event;
        self.next_event = id.next();
        id
    }

    fn schedule(&mut self, at: SimTime, priority: Priority, id: EventId, payload: Payload) -> DesResult<()> {
        self.queue.schedule(at, priority, id, payload)?;
        self.pending.insert(id);
        Ok(())
    }

    pub(crate) fn slot(&self, process: ProcessId) -> DesResult<&ProcessSlot<M>> {
        self.processes
            .get(process.index())
            .ok_or(DesError::UnknownProcess(process))
    }

    pub(crate) fn slot_mut(&mut self, process: ProcessId) -> DesResult<&mut ProcessSlot<M>> {
        self.processes
            .get_mut(process.index())
            .ok_or(DesError::UnknownProcess(process))
    }

    pub(crate) fn is_alive(&self, process: ProcessId) -> bool {
        self.slot(process).is_ok_and(|slot| slot.state.is_alive())
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    pub(crate) fn timeout(&mut self, delay: f64, priority: Priority) -> DesResult<EventId> {
        let at = self.now().checked_add(delay)?;
        let id = self.alloc_event();
        self.schedule(at, priority, id, Payload::Timeout)?;
        Ok(id)
    }

    /// Register `body` and schedule its start as an urgent event at `now`.
    pub(crate) fn spawn(&mut self, body: Box<dyn Process<M>>) -> DesResult<ProcessHandle> {
        let id = ProcessId::try_from(self.processes.len())
            .map_err(|_| DesError::Config("too many processes".into()))?;
        let exit = self.alloc_event();
        let start = self.alloc_event();
        self.schedule(self.now(), Priority::URGENT, start, Payload::Init(id))?;
        self.waiters.insert(start, vec![id]);
        self.pending.insert(exit);
        self.exits.insert(exit, id);

        let name = body.name().to_owned();
        debug!(process = %id, name = %name, at = %self.now(), "process registered");
        self.processes.push(ProcessSlot {
            name,
            state: ProcessState::Created,
            body: Some(body),
            waiting_on: Some(start),
            exit,
        });
        Ok(ProcessHandle { id, exit })
    }

    // ── Resources ─────────────────────────────────────────────────────────

    pub(crate) fn add_resource(&mut self, capacity: usize) -> DesResult<ResourceId> {
        self.resources.add(capacity)
    }

    pub(crate) fn request(&mut self, owner: ProcessId, resource: ResourceId) -> DesResult<Request> {
        // Validate before allocating any IDs.
        self.resources.get(resource)?;

        let id = self.next_request;
        self.next_request = id.next();
        let event = self.alloc_event();
        let request = Request { id, resource, owner, event };

        match self.resources.get_mut(resource)?.request(request) {
            Admission::Granted => {
                self.schedule(self.now(), Priority::NORMAL, event, Payload::Grant { resource, request: id })?;
            }
            Admission::Queued { position } => {
                debug!(%resource, request = %id, position, "request queued");
                self.pending.insert(event);
            }
        }
        Ok(request)
    }

    pub(crate) fn release(&mut self, request: &Request) -> DesResult<()> {
        let delivery = self
            .granted(request.resource, request.id)
            .map(|r| r.event)
            .filter(|event| self.queue.contains(*event));
        if let Some(event) = delivery {
            if self.waiters.contains_key(&event) {
                return Err(DesError::GrantUndelivered {
                    resource: request.resource,
                    request:  request.id,
                });
            }
        }
        let promoted = self.resources.get_mut(request.resource)?.release(request.id)?;

        // Nobody waits on it, so the grant can simply vanish.
        if let Some(event) = delivery {
            self.queue.remove(event);
            self.pending.remove(&event);
        }
        for next in promoted {
            debug!(resource = %next.resource, request = %next.id, owner = %next.owner, "queued request granted");
            self.schedule(
                self.now(),
                Priority::NORMAL,
                next.event,
                Payload::Grant { resource: next.resource, request: next.id },
            )?;
        }
        Ok(())
    }

    pub(crate) fn withdraw(&mut self, request: &Request) -> DesResult<()> {
        self.resources.get_mut(request.resource)?.withdraw(request.id)?;
        self.pending.remove(&request.event);
        Ok(())
    }

    /// Release `request` if it holds a slot, withdraw it if it still waits.
    pub(crate) fn relinquish(&mut self, request: &Request) -> DesResult<()> {
        if self.resources.get(request.resource)?.is_granted(request.id) {
            self.release(request)
        } else {
            self.withdraw(request)
        }
    }

    /// Look up a request that currently holds a slot.
    pub(crate) fn granted(&self, resource: ResourceId, request: RequestId) -> Option<Request> {
        self.resources
            .get(resource)
            .ok()?
            .users()
            .iter()
            .find(|r| r.id == request)
            .copied()
    }

    // ── Process lifecycle ─────────────────────────────────────────────────

    /// Park `process` on `event`.
    pub(crate) fn park(&mut self, process: ProcessId, event: EventId) -> DesResult<()> {
        let target = if self.pending.contains(&event) {
            if self.exits.get(&event) == Some(&process) {
                return Err(DesError::InvalidTarget {
                    process,
                    reason: "a process cannot wait for its own exit",
                });
            }
            event
        } else if let Some(&exited) = self.exits.get(&event) {
            // The exit already fired: resume the waiter right away through a
            // fresh exit notification.
            let fresh = self.alloc_event();
            self.schedule(self.now(), Priority::NORMAL, fresh, Payload::Exit(exited))?;
            fresh
        } else {
            return Err(DesError::UnknownEvent(event));
        };

        self.waiters.entry(target).or_default().push(process);
        let slot = self.slot_mut(process)?;
        slot.waiting_on = Some(target);
        slot.state = ProcessState::Suspended;
        Ok(())
    }

    /// Stop `process` from being resumed by whatever it waits on.
    ///
    /// Returns the event it was detached from.
    pub(crate) fn detach(&mut self, process: ProcessId) -> Option<EventId> {
        let event = self.slot_mut(process).ok()?.waiting_on.take()?;
        if let Some(list) = self.waiters.get_mut(&event) {
            list.retain(|&p| p != process);
            if list.is_empty() {
                self.waiters.remove(&event);
            }
        }
        Some(event)
    }

    /// Mark `process` terminated and announce its exit.
    pub(crate) fn finish(&mut self, process: ProcessId, state: ProcessState) -> DesResult<()> {
        let now = self.now();
        let slot = self.slot_mut(process)?;
        slot.state = state;
        slot.body = None;
        slot.waiting_on = None;
        let exit = slot.exit;

        let held: usize = self.resources.iter().map(|r| r.granted_to(process).count()).sum();
        if held > 0 {
            warn!(%process, held, "process exited while holding resource slots");
        }
        self.schedule(now, Priority::NORMAL, exit, Payload::Exit(process))
    }

    pub(crate) fn interrupt(&mut self, process: ProcessId, cause: String) -> DesResult<()> {
        if !self.slot(process)?.state.is_alive() {
            return Err(DesError::InvalidTarget { process, reason: "process has terminated" });
        }
        let id = self.alloc_event();
        self.schedule(self.now(), Priority::URGENT, id, Payload::Interrupt { process, cause })
    }

    /// Terminate `process` from the outside.
    ///
    /// Its pending wake-up is removed from the queue (unless someone else
    /// waits on it too) and its queued requests are withdrawn.  Releasing its
    /// granted slots may grant them to the next waiters.
    pub(crate) fn cancel(&mut self, process: ProcessId) -> DesResult<()> {
        let slot = self.slot(process)?;
        if !slot.state.is_alive() {
            return Err(DesError::InvalidTarget { process, reason: "process has terminated" });
        }
        if slot.body.is_none() {
            return Err(DesError::InvalidTarget { process, reason: "process is running" });
        }

        if let Some(event) = self.detach(process) {
            self.drop_orphan(event);
        }

        let (withdrawn, released) = self.free_slots(process)?;
        debug!(%process, withdrawn, released, "process cancelled");
        self.finish(process, ProcessState::Cancelled)
    }

    /// Withdraw every queued request of `process` and release every slot it
    /// holds.  `process` must no longer be waiting on anything.
    ///
    /// Returns `(withdrawn, released)`.
    pub(crate) fn free_slots(&mut self, process: ProcessId) -> DesResult<(usize, usize)> {
        let mut queued = Vec::new();
        let mut granted = Vec::new();
        for resource in self.resources.iter() {
            queued.extend(resource.queued_for(process).copied());
            granted.extend(resource.granted_to(process).copied());
        }
        for request in &queued {
            self.withdraw(request)?;
        }
        for request in &granted {
            self.release(request)?;
        }
        Ok((queued.len(), granted.len()))
    }

    /// Remove a queued event nobody is left waiting on.  Exit events are kept
    /// since they also serve late waiters.
    fn drop_orphan(&mut self, event: EventId) {
        if self.waiters.contains_key(&event) || self.exits.contains_key(&event) {
            return;
        }
        if self.queue.remove(event).is_some() {
            self.pending.remove(&event);
        }
    }
}
