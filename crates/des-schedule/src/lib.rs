//! `des-schedule`: event records and the time-ordered event queue.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`event`]       | `Event`, `EventKey`, `Priority`, `Payload`            |
//! | [`event_queue`] | `EventQueue` (`BTreeMap<EventKey, Event>`)            |
//!
//! # Ordering model (summary)
//!
//! Every scheduled event gets a key:
//!
//! ```text
//! key = (time, priority, sequence)
//! ```
//!
//! `sequence` is a per-queue counter assigned at scheduling time, so two
//! events with equal time and priority always pop in the order they were
//! scheduled.  Given the same sequence of scheduling calls, the queue pops
//! the same sequence of events, so runs are reproducible.

pub mod event;
pub mod event_queue;


pub use event::{Event, EventKey, Payload, Priority};
pub use event_queue::EventQueue;
