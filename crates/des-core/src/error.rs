//! Engine error type.
//!
//! `des-schedule` and `des-resource` report their precondition violations
//! through `DesError` directly; `des-sim` wraps it as one variant of
//! `SimError` and of `ProcessError` so entity code can use `?` on every
//! engine call.

use thiserror::Error;

use crate::{EventId, ProcessId, RequestId, ResourceId, SimTime};

/// The common error type for all `des-*` crates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesError {
    #[error("invalid delay {0}: delays must be finite and non-negative")]
    InvalidDelay(f64),

    #[error("request {request} is not currently granted by resource {resource}")]
    InvalidRelease {
        resource: ResourceId,
        request:  RequestId,
    },

    #[error("request {request} on resource {resource} was granted but its waiters have not been woken yet")]
    GrantUndelivered {
        resource: ResourceId,
        request:  RequestId,
    },

    #[error("request {request} is not waiting on resource {resource}")]
    NotQueued {
        resource: ResourceId,
        request:  RequestId,
    },

    #[error("invalid capacity {0}: resources need at least one slot")]
    InvalidCapacity(usize),

    #[error("resource {0} not found")]
    UnknownResource(ResourceId),

    #[error("process {0} not found")]
    UnknownProcess(ProcessId),

    #[error("event {0} is neither pending nor a process exit")]
    UnknownEvent(EventId),

    #[error("event {0} is already scheduled")]
    DuplicateEvent(EventId),

    #[error("event {id} scheduled at {at}, before the last processed time {floor}")]
    EventInPast {
        id:    EventId,
        at:    SimTime,
        floor: SimTime,
    },

    #[error("cannot target process {process}: {reason}")]
    InvalidTarget {
        process: ProcessId,
        reason:  &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `des-*` crates.
pub type DesResult<T> = Result<T, DesError>;
