//! `WaypointCursor`: the per-entity read head over recorded movements.

use rp_core::{MergePolicy, VirtualTime};

use crate::{Movement, Waypoint};

/// A waypoint taken off the cursor by [`WaypointCursor::next_waypoint`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Consumed {
    pub waypoint: Waypoint,
    /// `true` if this was the first waypoint of its movement, i.e. the
    /// entity was between trips before reaching it.  A single-waypoint
    /// movement counts as first too, so it is reached hidden rather than
    /// shown and animated to as the recorded replays did.
    pub first_of_movement: bool,
}

/// Ordered movements plus a `(movement, waypoint)` read position.
///
/// # Exhaustion
///
/// When consumption rolls past the last waypoint of the last movement the
/// cursor enters the *finished* state.  Under [`MergePolicy::Append`] that
/// state is a latch: movements merged afterwards are still recorded (they
/// show up in [`movements`][Self::movements]) but are never yielded.  Under
/// [`MergePolicy::TimeOrdered`] a merge that lands past the read head clears
/// it again.  A cursor that has never held a movement is not finished; it
/// simply has nothing to yield until data is merged in.
#[derive(Clone, Debug, Default)]
pub struct WaypointCursor {
    movements:    Vec<Movement>,
    movement_idx: usize,
    waypoint_idx: usize,
    finished:     bool,
}

impl WaypointCursor {
    pub fn new(movements: impl IntoIterator<Item = Movement>) -> Self {
        let mut cursor = Self::default();
        cursor.add_movements(movements, MergePolicy::Append);
        cursor
    }

    /// Merge more movements without moving the read position.
    ///
    /// With [`MergePolicy::Append`] movements go to the end in arrival order.
    /// With [`MergePolicy::TimeOrdered`] each one is inserted among the
    /// movements not yet started, after any with an equal or earlier start,
    /// and a finished cursor resumes at the first of them.
    pub fn add_movements(&mut self, movements: impl IntoIterator<Item = Movement>, policy: MergePolicy) {
        for movement in movements {
            match policy {
                MergePolicy::Append => self.movements.push(movement),
                MergePolicy::TimeOrdered => {
                    let at = self.insertion_index(movement.start_time());
                    self.movements.insert(at, movement);
                }
            }
        }
        if policy == MergePolicy::TimeOrdered && self.movement_idx < self.movements.len() {
            self.finished = false;
        }
    }

    /// `true` once every waypoint has been consumed.  Permanent under
    /// [`MergePolicy::Append`].
    #[inline]
    pub fn has_finished_history(&self) -> bool {
        self.finished
    }

    /// Start time of the movement under the cursor, or
    /// [`VirtualTime::NEVER`] if there is none.
    pub fn next_wakeup(&self) -> VirtualTime {
        if self.finished {
            return VirtualTime::NEVER;
        }
        self.movements
            .get(self.movement_idx)
            .map_or(VirtualTime::NEVER, Movement::start_time)
    }

    /// The next waypoint, without consuming it.
    pub fn peek_next(&self) -> Option<&Waypoint> {
        if self.finished {
            return None;
        }
        self.movements
            .get(self.movement_idx)?
            .waypoints()
            .get(self.waypoint_idx)
    }

    /// Consume the next waypoint, rolling into the next movement after the
    /// last waypoint of the current one.
    pub fn next_waypoint(&mut self) -> Option<Consumed> {
        if self.finished {
            return None;
        }
        let movement = self.movements.get(self.movement_idx)?;
        let waypoint = *movement.waypoints().get(self.waypoint_idx)?;
        let first_of_movement = self.waypoint_idx == 0;

        self.waypoint_idx += 1;
        if self.waypoint_idx >= movement.waypoints().len() {
            self.movement_idx += 1;
            self.waypoint_idx = 0;
            if self.movement_idx >= self.movements.len() {
                self.finished = true;
            }
        }

        Some(Consumed { waypoint, first_of_movement })
    }

    /// Discard every waypoint strictly older than `time`.  Returns how many
    /// were dropped.
    pub fn prune_before(&mut self, time: VirtualTime) -> usize {
        let mut dropped = 0;
        while self.peek_next().is_some_and(|w| w.time < time) {
            self.next_waypoint();
            dropped += 1;
        }
        dropped
    }

    /// Every movement held, consumed or not, in cursor order.
    #[inline]
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    /// `(movement index, waypoint index)` of the read head.
    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.movement_idx, self.waypoint_idx)
    }

    /// Waypoints not yet consumed.
    pub fn remaining(&self) -> usize {
        if self.finished {
            return 0;
        }
        self.movements
            .iter()
            .skip(self.movement_idx)
            .map(|m| m.waypoints().len())
            .sum::<usize>()
            .saturating_sub(self.waypoint_idx)
    }

    /// First index a new movement starting at `start` may take: never before
    /// a movement the cursor has already entered.
    fn insertion_index(&self, start: VirtualTime) -> usize {
        let floor = if self.waypoint_idx > 0 {
            self.movement_idx + 1
        } else {
            self.movement_idx
        };
        let floor = floor.min(self.movements.len());
        self.movements[floor..]
            .iter()
            .position(|m| m.start_time() > start)
            .map_or(self.movements.len(), |offset| floor + offset)
    }
}
