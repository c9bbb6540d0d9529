use des_core::{DesError, EventId, ProcessId, SimTime};
use thiserror::Error;

use crate::EnvState;

/// Failure raised out of a process body.
///
/// Engine calls made through [`Context`][crate::Context] return
/// [`DesError`], which converts into this type, so entity code can use `?`
/// on them directly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Des(#[from] DesError),

    #[error("unhandled interrupt: {0}")]
    Interrupted(String),

    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    /// A model-level failure with a message.
    pub fn failed(msg: impl Into<String>) -> Self {
        ProcessError::Failed(msg.into())
    }
}

pub type ProcessResult<T> = Result<T, ProcessError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("process {process} ({name}) failed: {source}")]
    ProcessFailure {
        process: ProcessId,
        name:    String,
        #[source]
        source:  ProcessError,
    },

    #[error("invalid run bound {until}: must be finite and not before now ({now})")]
    InvalidUntil {
        until: f64,
        now:   SimTime,
    },

    #[error("event {0} was never processed before the queue ran dry")]
    UntilEventNotTriggered(EventId),

    #[error("environment is {0}; create a fresh one to run again")]
    Terminal(EnvState),

    #[error(transparent)]
    Des(#[from] DesError),
}

pub type SimResult<T> = Result<T, SimError>;
