//! `des-resource`: bounded-capacity shared resources with FIFO admission.
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`resource`] | `Resource`, `Request`, `Admission`                    |
//! | [`pool`]     | `ResourcePool`, a dense `ResourceId → Resource` table |
//!
//! # Division of labour
//!
//! Types here are pure bookkeeping: they decide *who* holds a slot and *who*
//! is next, and report it back.  They never touch the event queue.  The
//! engine (`des-sim`) turns an immediate grant or a promotion returned by
//! [`Resource::release`] into a grant event scheduled at the current time.

pub mod pool;
pub mod resource;

#[cfg(test)]
mod tests;

pub use pool::ResourcePool;
pub use resource::{Admission, Request, Resource};
