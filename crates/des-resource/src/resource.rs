//! A single resource: capacity, granted users, FIFO wait queue.

use std::collections::VecDeque;

use des_core::{DesError, DesResult, EventId, ProcessId, RequestId, ResourceId};

/// One acquisition attempt.
///
/// Created by the engine when a process asks for a slot; lives in either the
/// resource's user list (granted) or its wait queue until released or
/// withdrawn.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    pub id:       RequestId,
    pub resource: ResourceId,
    /// Process that made the request.
    pub owner:    ProcessId,
    /// Event that fires when the request is granted.
    pub event:    EventId,
}

/// Outcome of [`Resource::request`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Admission {
    /// A slot was free and nobody was waiting: the request holds a slot now.
    Granted,
    /// The request joined the wait queue at `position` (0 = head).
    Queued { position: usize },
}

/// A bounded-capacity shared entity with strict FIFO admission.
///
/// Invariants:
///
/// - `in_use() <= capacity()` at all times.
/// - The wait queue is non-empty only while every slot is taken.
/// - Requests are granted in arrival order, never out of turn.
#[derive(Clone, Debug)]
pub struct Resource {
    id:       ResourceId,
    capacity: usize,
    /// Granted requests, in grant order.
    users:    Vec<Request>,
    queue:    VecDeque<Request>,
    /// Total grants over the resource's lifetime.
    grants:   u64,
}

impl Resource {
    /// Create a resource with `capacity` slots.
    pub fn new(id: ResourceId, capacity: usize) -> DesResult<Self> {
        if capacity == 0 {
            return Err(DesError::InvalidCapacity(capacity));
        }
        Ok(Self {
            id,
            capacity,
            users: Vec::with_capacity(capacity),
            queue: VecDeque::new(),
            grants: 0,
        })
    }

    /// Admit `request`: grant it if a slot is free and nobody is queued,
    /// otherwise append it to the wait queue.
    pub fn request(&mut self, request: Request) -> Admission {
        debug_assert_eq!(request.resource, self.id);
        if self.users.len() < self.capacity && self.queue.is_empty() {
            self.grant(request);
            Admission::Granted
        } else {
            self.queue.push_back(request);
            Admission::Queued { position: self.queue.len() - 1 }
        }
    }

    /// Give back the slot held by `request`.
    ///
    /// Returns the queued requests promoted into freed slots, in grant order.
    /// The caller must schedule a grant event for each.  Fails with
    /// [`DesError::InvalidRelease`], leaving the resource untouched, if
    /// `request` is not currently granted here.
    pub fn release(&mut self, request: RequestId) -> DesResult<Vec<Request>> {
        let Some(pos) = self.users.iter().position(|r| r.id == request) else {
            return Err(DesError::InvalidRelease { resource: self.id, request });
        };
        self.users.remove(pos);

        let mut promoted = Vec::new();
        while self.users.len() < self.capacity {
            let Some(next) = self.queue.pop_front() else { break };
            self.grant(next);
            promoted.push(next);
        }
        Ok(promoted)
    }

    /// Remove a request that is still waiting.
    ///
    /// Fails with [`DesError::NotQueued`] if `request` is not in the wait
    /// queue (already granted, released, or never made here).
    pub fn withdraw(&mut self, request: RequestId) -> DesResult<Request> {
        self.queue
            .iter()
            .position(|r| r.id == request)
            .and_then(|pos| self.queue.remove(pos))
            .ok_or(DesError::NotQueued { resource: self.id, request })
    }

    fn grant(&mut self, request: Request) {
        self.users.push(request);
        self.grants += 1;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently granted.
    pub fn in_use(&self) -> usize {
        self.users.len()
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.capacity - self.users.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Total grants since creation.
    pub fn total_grants(&self) -> u64 {
        self.grants
    }

    pub fn is_granted(&self, request: RequestId) -> bool {
        self.users.iter().any(|r| r.id == request)
    }

    pub fn is_queued(&self, request: RequestId) -> bool {
        self.queue.iter().any(|r| r.id == request)
    }

    /// Granted requests in grant order.
    pub fn users(&self) -> &[Request] {
        &self.users
    }

    /// Waiting requests, head first.
    pub fn waiting(&self) -> impl Iterator<Item = &Request> {
        self.queue.iter()
    }

    /// Granted requests owned by `owner`.
    pub fn granted_to(&self, owner: ProcessId) -> impl Iterator<Item = &Request> {
        self.users.iter().filter(move |r| r.owner == owner)
    }

    /// Waiting requests owned by `owner`.
    pub fn queued_for(&self, owner: ProcessId) -> impl Iterator<Item = &Request> {
        self.queue.iter().filter(move |r| r.owner == owner)
    }
}
