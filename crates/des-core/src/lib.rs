//! `des-core`: foundational types for the `rust_des` simulation engine.
//!
//! This crate is a dependency of every other `des-*` crate.  It intentionally
//! has no `des-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ProcessId`, `ResourceId`, `EventId`, `RequestId`     |
//! | [`time`]        | `SimTime`, `SimClock`, `SimConfig`                    |
//! | [`rng`]         | `ProcessRng`, one random stream per process           |
//! | [`error`]       | `DesError`, `DesResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DesError, DesResult};
pub use ids::{EventId, ProcessId, RequestId, ResourceId};
pub use rng::ProcessRng;
pub use time::{SimClock, SimConfig, SimTime};
