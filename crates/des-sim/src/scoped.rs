//! Scoped resource acquisition.

use std::marker::PhantomData;
use std::mem;

use des_core::ResourceId;
use des_resource::Request;
use tracing::warn;

use crate::{Context, Process, ProcessError, ProcessResult, Resume, Step};

/// Acquire a slot of `resource`, run the body built by `make`, release the
/// slot when the body ends.
///
/// The body is created once the slot is granted and starts with
/// [`Resume::Init`].  The slot is given back when the body returns
/// [`Step::Done`] and also when it fails.  An interrupt that arrives while
/// the request still waits withdraws the request and fails the process with
/// [`ProcessError::Interrupted`]; once the slot is held, interrupts are passed
/// on to the body.  If the whole process is cancelled, or fails because the
/// body asked to wait on something invalid, the engine releases the slot.
///
/// The body must not release `request` itself.
///
/// ```rust,ignore
/// env.process(with_resource(charger, |_slot| {
///     let mut charging = false;
///     from_fn("charge", move |ctx, _: &mut (), _| {
///         if charging {
///             return Ok(Step::Done);
///         }
///         charging = true;
///         Ok(Step::Wait(ctx.timeout(5.0)?))
///     })
/// }))?;
/// ```
pub fn with_resource<M, F, B>(resource: ResourceId, make: F) -> Scoped<M, F, B>
where
    F: FnOnce(Request) -> B + 'static,
    B: Process<M>,
{
    Scoped {
        name:   "with_resource".to_owned(),
        resource,
        phase:  Phase::Start(make),
        _model: PhantomData,
    }
}

enum Phase<F, B> {
    Start(F),
    Acquiring { request: Request, make: F },
    Holding { request: Request, body: B },
    Done,
}

/// Process returned by [`with_resource`].
pub struct Scoped<M, F, B> {
    name:     String,
    resource: ResourceId,
    phase:    Phase<F, B>,
    _model:   PhantomData<fn(&mut M)>,
}

impl<M, F, B> Scoped<M, F, B> {
    /// Set the name used in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn hold(
        &mut self,
        ctx:      &mut Context<'_, M>,
        model:    &mut M,
        request:  Request,
        mut body: B,
        signal:   Resume,
    ) -> ProcessResult<Step>
    where
        M: 'static,
        B: Process<M>,
    {
        match body.resume(ctx, model, signal) {
            Ok(Step::Wait(event)) => {
                self.phase = Phase::Holding { request, body };
                Ok(Step::Wait(event))
            }
            Ok(Step::Done) => {
                ctx.release(&request)?;
                Ok(Step::Done)
            }
            Err(err) => {
                if let Err(release) = ctx.release(&request) {
                    warn!(process = %ctx.current(), error = %release, "slot not released after body failure");
                }
                Err(err)
            }
        }
    }
}

impl<M: 'static, F, B> Process<M> for Scoped<M, F, B>
where
    F: FnOnce(Request) -> B + 'static,
    B: Process<M>,
{
    fn resume(
        &mut self,
        ctx:    &mut Context<'_, M>,
        model:  &mut M,
        signal: Resume,
    ) -> ProcessResult<Step> {
        match mem::replace(&mut self.phase, Phase::Done) {
            Phase::Start(make) => {
                if let Resume::Interrupted(cause) = signal {
                    return Err(ProcessError::Interrupted(cause));
                }
                let request = ctx.request(self.resource)?;
                self.phase = Phase::Acquiring { request, make };
                Ok(Step::Wait(request.event))
            }

            Phase::Acquiring { request, make } => match signal {
                Resume::Granted(_) => {
                    let body = make(request);
                    self.hold(ctx, model, request, body, Resume::Init)
                }
                Resume::Interrupted(cause) => {
                    ctx.relinquish(&request)?;
                    Err(ProcessError::Interrupted(cause))
                }
                other => {
                    ctx.relinquish(&request)?;
                    Err(ProcessError::failed(format!("unexpected {other:?} while acquiring a slot")))
                }
            },

            Phase::Holding { request, body } => self.hold(ctx, model, request, body, signal),

            Phase::Done => Err(ProcessError::failed("resumed after completion")),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
