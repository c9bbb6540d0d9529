//! The `Process` trait, the main extension point for user code.

use std::fmt;
use std::marker::PhantomData;

use des_core::{EventId, ProcessId};
use des_resource::Request;

use crate::{Context, ProcessResult};

// ── Signals ───────────────────────────────────────────────────────────────────

/// What a process is resumed with.
#[derive(Clone, Debug, PartialEq)]
pub enum Resume {
    /// First resumption after registration.
    Init,
    /// The timeout the process waited on elapsed.
    Timeout,
    /// The awaited resource request now holds a slot.
    Granted(Request),
    /// The awaited process terminated.
    Exited(ProcessId),
    /// Another party interrupted the process.  Whatever it waited on before
    /// no longer resumes it.
    Interrupted(String),
}

/// What a process hands back to the engine after each resumption.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Step {
    /// Suspend until the event fires.
    Wait(EventId),
    /// The body is complete.
    Done,
}

// ── ProcessState ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ProcessState {
    /// Registered; the start event has not fired yet.
    Created,
    /// Its body is executing right now.
    Running,
    /// Parked on an event.
    Suspended,
    Finished,
    Failed,
    Cancelled,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Created | ProcessState::Running | ProcessState::Suspended)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Created   => "created",
            ProcessState::Running   => "running",
            ProcessState::Suspended => "suspended",
            ProcessState::Finished  => "finished",
            ProcessState::Failed    => "failed",
            ProcessState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ── ProcessHandle ─────────────────────────────────────────────────────────────

/// Returned when a process is registered.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ProcessHandle {
    pub id:   ProcessId,
    /// Fires when the process finishes or is cancelled.  Other processes can
    /// `Step::Wait` on it, even after it has fired.
    pub exit: EventId,
}

// ── Process ───────────────────────────────────────────────────────────────────

/// One simulated entity's lifecycle, written as an explicit state machine.
///
/// The engine calls [`resume`][Self::resume] once per event the process is
/// waiting on.  Each call runs the body up to its next suspension point and
/// returns either the event to wait on next or [`Step::Done`].  Returning an
/// error fails the whole run; slots the process still holds are released
/// and its queued requests withdrawn.
///
/// `M` is the caller-owned model state (counters, result logs, …) passed to
/// every run call.  The engine never inspects it.
///
/// # Example
///
/// ```rust,ignore
/// struct Car { driving: bool }
///
/// impl Process<Vec<f64>> for Car {
///     fn resume(&mut self, ctx: &mut Context<'_, Vec<f64>>, log: &mut Vec<f64>, _: Resume)
///         -> ProcessResult<Step>
///     {
///         log.push(ctx.now().as_f64());
///         self.driving = !self.driving;
///         let delay = if self.driving { 2.0 } else { 5.0 };
///         Ok(Step::Wait(ctx.timeout(delay)?))
///     }
/// }
/// ```
pub trait Process<M>: 'static {
    fn resume(
        &mut self,
        ctx:    &mut Context<'_, M>,
        model:  &mut M,
        signal: Resume,
    ) -> ProcessResult<Step>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "process"
    }
}

// ── Closure adapter ───────────────────────────────────────────────────────────

/// A [`Process`] backed by a closure.  Build with [`from_fn`].
pub struct FnProcess<M, F> {
    name: String,
    f:    F,
    _model: PhantomData<fn(&mut M)>,
}

/// Wrap a closure as a process.  State the closure needs across resumptions
/// lives in its captures.
pub fn from_fn<M, F>(name: impl Into<String>, f: F) -> FnProcess<M, F>
where
    F: FnMut(&mut Context<'_, M>, &mut M, Resume) -> ProcessResult<Step> + 'static,
{
    FnProcess { name: name.into(), f, _model: PhantomData }
}

impl<M: 'static, F> Process<M> for FnProcess<M, F>
where
    F: FnMut(&mut Context<'_, M>, &mut M, Resume) -> ProcessResult<Step> + 'static,
{
    fn resume(
        &mut self,
        ctx:    &mut Context<'_, M>,
        model:  &mut M,
        signal: Resume,
    ) -> ProcessResult<Step> {
        (self.f)(ctx, model, signal)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
