//! `rp-entity` — replayed entities and everything that moves them on screen.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`render`]     | `Renderer`, `Marker`, `PathTrace` capabilities, `NoopRenderer` |
//! | [`recording`]  | `RecordingRenderer`, `RenderLog` — in-memory renderer      |
//! | [`animation`]  | `AnimationController`, `MoveContext`, `MoveOutcome`        |
//! | [`entity`]     | `Entity`, `EntityState`, `Wakeup`                          |
//! | [`registry`]   | `EntityRegistry`, `Upsert`                                 |
//! | [`summary`]    | `EntitySummary`, `TripSummary`                             |
//!
//! # Wakeup model (summary)
//!
//! ```text
//! Unseen ──first wakeup──▶ Idle ──animated move──▶ Moving ──last sub-step──▶ Idle
//!                            │                                                │
//!                            └──────────── cursor exhausted ─────────▶ Finished
//! ```
//!
//! `Finished` is final under `MergePolicy::Append`.  Under `TimeOrdered`, a
//! merge that brings later trips returns the entity to `Idle`, and its next
//! wakeup teleports the hidden marker to the new trip's start.
//!
//! An entity is woken by the scheduler once its `next_wakeup_time` has
//! passed and it is not moving.  If the clock has overtaken several of its
//! waypoints, they are collapsed into one instant jump.

pub mod animation;
pub mod entity;
pub mod recording;
pub mod registry;
pub mod render;
pub mod summary;


pub use animation::{AnimationController, MoveContext, MoveOutcome};
pub use entity::{Entity, EntityState, Wakeup};
pub use recording::{MarkerView, RecordingRenderer, RenderCommand, RenderLog};
pub use registry::{EntityRegistry, Upsert};
pub use render::{Marker, NoopRenderer, PathTrace, Renderer};
pub use summary::{EntitySummary, TripSummary};
