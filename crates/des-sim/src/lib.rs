//! `des-sim`: the process-based discrete-event environment.
//!
//! # Stepping loop
//!
//! ```text
//! loop:
//!   ① Peek      the earliest event; stop if the queue is empty or the time
//!                bound is reached (the event stays queued).
//!   ② Pop       it and move the clock to its time.
//!   ③ Deliver   resume every process waiting on it, in wait order, or raise
//!                an interrupt into its target.
//!   ④ Apply     each resumed process parks on a new event, finishes (its
//!                exit event is scheduled) or fails the run.
//!   ⑤ Stop      after the awaited event of an event-bound run.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`env`]      | `Environment`, `EnvState`, the run operations             |
//! | [`process`]  | `Process` trait, `Resume`, `Step`, `from_fn`              |
//! | [`context`]  | `Context`: engine calls available inside a process        |
//! | [`scoped`]   | `with_resource`: acquire, run a body, always release      |
//! | [`observer`] | `SimObserver`, `NoopObserver`, `EventTrace`               |
//! | [`builder`]  | `EnvironmentBuilder`                                      |
//! | [`error`]    | `ProcessError`, `SimError`                                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use des_core::SimConfig;
//! use des_sim::{from_fn, EnvironmentBuilder, NoopObserver, Resume, Step};
//!
//! let mut env = EnvironmentBuilder::new(SimConfig::default())
//!     .process(from_fn("clock", |ctx, ticks: &mut Vec<f64>, _: Resume| {
//!         ticks.push(ctx.now().as_f64());
//!         Ok(Step::Wait(ctx.timeout(1.0)?))
//!     }))
//!     .build()?;
//!
//! let mut ticks = Vec::new();
//! env.run_until(5.0, &mut ticks, &mut NoopObserver)?;
//! assert_eq!(ticks, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
//! ```

pub mod builder;
pub mod context;
pub mod env;
pub mod error;
pub mod observer;
pub mod process;
pub mod scoped;

mod kernel;


pub use builder::EnvironmentBuilder;
pub use context::Context;
pub use env::{EnvState, Environment};
pub use error::{ProcessError, ProcessResult, SimError, SimResult};
pub use observer::{EventTrace, NoopObserver, SimObserver, TraceRecord};
pub use process::{from_fn, FnProcess, Process, ProcessHandle, ProcessState, Resume, Step};
pub use scoped::{with_resource, Scoped};
