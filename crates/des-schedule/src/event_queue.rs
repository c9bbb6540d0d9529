//! `EventQueue`: the pending-event set, ordered by `(time, priority, seq)`.
//!
//! # Why a `BTreeMap`
//!
//! A binary heap would give the same pop order, but cancelling a process has
//! to pull its pending timeout out of the queue so the clock does not advance
//! to a time nobody cares about any more.  `BTreeMap` supports removal by key
//! in O(log N); a side index maps `EventId → EventKey` so callers can remove
//! by the identity they actually hold.
//!
//! # Monotonic pops
//!
//! The queue remembers the time of the last popped event (`floor`) and
//! refuses to schedule anything earlier.  Together with the ordered map this
//! guarantees popped times never decrease over the lifetime of the queue.

use std::collections::BTreeMap;

use des_core::{DesError, DesResult, EventId, SimTime};
use rustc_hash::FxHashMap;

use crate::{Event, EventKey, Payload, Priority};

/// A priority queue of scheduled events.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: BTreeMap<EventKey, Event>,
    index: FxHashMap<EventId, EventKey>,
    /// Sequence number handed to the next scheduled event.
    next_seq: u64,
    /// Time of the most recently popped event.
    floor: SimTime,
}

impl EventQueue {
    /// An empty queue whose clock starts at `start`.
    pub fn new(start: SimTime) -> Self {
        Self { floor: start, ..Self::default() }
    }

    /// Schedule event `id` at `time`.
    ///
    /// Fails with [`DesError::EventInPast`] if `time` is earlier than the last
    /// popped event, and with [`DesError::DuplicateEvent`] if `id` is already
    /// queued.  Neither failure modifies the queue.
    pub fn schedule(
        &mut self,
        time:     SimTime,
        priority: Priority,
        id:       EventId,
        payload:  Payload,
    ) -> DesResult<EventKey> {
        if time < self.floor {
            return Err(DesError::EventInPast { id, at: time, floor: self.floor });
        }
        if self.index.contains_key(&id) {
            return Err(DesError::DuplicateEvent(id));
        }
        let key = EventKey { time, priority, seq: self.next_seq };
        self.next_seq += 1;
        self.index.insert(id, key);
        self.inner.insert(key, Event { key, id, payload });
        Ok(key)
    }

    /// The earliest event, without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.inner.first_key_value().map(|(_, event)| event)
    }

    /// Time of the earliest event, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().map(|key| key.time)
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        let (key, event) = self.inner.pop_first()?;
        self.index.remove(&event.id);
        self.floor = key.time;
        Some(event)
    }

    /// Withdraw a scheduled event.  Returns `None` if `id` is not queued.
    pub fn remove(&mut self, id: EventId) -> Option<Event> {
        let key = self.index.remove(&id)?;
        self.inner.remove(&key)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.index.contains_key(&id)
    }

    /// Scheduled time of `id`, if queued.
    pub fn scheduled_at(&self, id: EventId) -> Option<SimTime> {
        self.index.get(&id).map(|key| key.time)
    }

    /// Time of the last popped event (or the start time before any pop).
    pub fn floor(&self) -> SimTime {
        self.floor
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Queued events in pop order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.inner.values()
    }
}
