//! `rp-history` — recorded movements and the cursor that replays them.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`movement`]  | `Waypoint`, `Movement`                                    |
//! | [`cursor`]    | `WaypointCursor`, `Consumed`                              |
//! | [`error`]     | `HistoryError`, `HistoryResult<T>`                        |
//!
//! # Cursor model (summary)
//!
//! ```text
//! movements:  [ m0: w0 w1 w2 ] [ m1: w0 w1 ] [ m2: w0 ]
//!                      ^
//!                      (movement 0, waypoint 1) = next waypoint
//! ```
//!
//! `peek_next` reads the waypoint under the cursor, `next_waypoint` reads it
//! and advances, rolling into the following movement after the last
//! waypoint.  When the movement index passes the end the cursor is
//! exhausted; only a time-ordered merge can bring it back.

pub mod cursor;
pub mod error;
pub mod movement;


pub use cursor::{Consumed, WaypointCursor};
pub use error::{HistoryError, HistoryResult};
pub use movement::{Movement, Waypoint};
