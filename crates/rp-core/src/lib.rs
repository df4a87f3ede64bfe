//! `rp-core` — foundational types for the `rust_replay` trace replayer.
//!
//! This crate is a dependency of every other `rp-*` crate.  It has no `rp-*`
//! dependencies and few external ones (`chrono`, `serde`, `thiserror`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `EntityId`, `TaskId`                                  |
//! | [`geo`]         | `GeoPoint`, interpolation, haversine distance         |
//! | [`time`]        | `VirtualTime`, `WallTime`                             |
//! | [`config`]      | `ReplayConfig`, `MergePolicy`                         |
//! | [`timer`]       | `TimerQueue`, `TimerTarget`                           |
//! | [`error`]       | `CoreError`, `CoreResult`                             |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod time;
pub mod timer;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{MergePolicy, ReplayConfig};
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{EntityId, TaskId};
pub use time::{VirtualTime, WallTime};
pub use timer::{TimerQueue, TimerTarget};
