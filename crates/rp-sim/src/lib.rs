//! `rp-sim` — the replay scheduler.
//!
//! # Tick loop
//!
//! ```text
//! every speed_ms of wall time:
//!   ① Wake     — each entity with next_wakeup_time <= counter, > 0 and not
//!                moving consumes its due waypoints (ascending EntityId).
//!   ② Advance  — counter += step_size; request the next chunk if it starts
//!                within the prefetch window; stop at the final lastTime.
//!   ③ Notify   — publish Clock { counter, timestamp }.
//!   ④ Complete — fetch and merge the chunks requested during the tick.
//!
//! in between: animation sub-steps fire from the same timer queue.
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                          |
//! |----------------|---------------------------------------------------|
//! | [`scheduler`]  | `Scheduler` — clock, wakeups, loads, timer pump   |
//! | [`builder`]    | `SchedulerBuilder`                                |
//! | [`event`]      | `Topic`, `ReplayEvent`                            |
//! | [`error`]      | `SimError`, `SimResult<T>`                        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rp_data::DirFetcher;
//! use rp_entity::NoopRenderer;
//! use rp_sim::SchedulerBuilder;
//!
//! let mut scheduler = SchedulerBuilder::new(DirFetcher::new("data"), NoopRenderer).build()?;
//! scheduler.load_data()?;
//! scheduler.start();
//! scheduler.run_to_end()?;
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use builder::SchedulerBuilder;
pub use error::{SimError, SimResult};
pub use event::{ReplayEvent, Topic};
pub use scheduler::Scheduler;
