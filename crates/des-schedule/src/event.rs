//! Event records.

use std::fmt;

use des_core::{EventId, ProcessId, RequestId, ResourceId, SimTime};

// ── Priority ──────────────────────────────────────────────────────────────────

/// Tiebreak among events at the same time.  Lower is served first.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Priority(pub i32);

impl Priority {
    /// Process start-up and interrupts.
    pub const URGENT: Priority = Priority(0);
    /// Timeouts, resource grants and process exits.
    pub const NORMAL: Priority = Priority(1);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

// ── EventKey ──────────────────────────────────────────────────────────────────

/// Total order over scheduled events: time, then priority, then sequence.
///
/// Field order matters: the derived `Ord` is lexicographic.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventKey {
    pub time:     SimTime,
    pub priority: Priority,
    pub seq:      u64,
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// What the engine delivers when an event fires.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    /// First resumption of a newly registered process.
    Init(ProcessId),

    /// A delay elapsed.  Delivered to every process waiting on the event.
    Timeout,

    /// A resource request was granted.
    Grant {
        resource: ResourceId,
        request:  RequestId,
    },

    /// A process terminated (finished or was cancelled).
    Exit(ProcessId),

    /// Raise `cause` into `process`, detaching it from whatever it waits on.
    Interrupt {
        process: ProcessId,
        cause:   String,
    },
}

impl Payload {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Init(_)           => "init",
            Payload::Timeout           => "timeout",
            Payload::Grant { .. }      => "grant",
            Payload::Exit(_)           => "exit",
            Payload::Interrupt { .. }  => "interrupt",
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// A scheduled point where simulation time and a process resumption meet.
///
/// Events are only constructed by [`EventQueue::schedule`][crate::EventQueue::schedule]
/// and are never mutated afterwards; the queue hands them out by value on pop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub key:     EventKey,
    pub id:      EventId,
    pub payload: Payload,
}

impl Event {
    #[inline]
    pub fn time(&self) -> SimTime {
        self.key.time
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.key.priority
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.key.seq
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} (prio {}, seq {})",
            self.payload.kind(),
            self.id,
            self.key.time,
            self.key.priority.0,
            self.key.seq,
        )
    }
}
