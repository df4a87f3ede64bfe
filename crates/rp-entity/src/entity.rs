//! `Entity`: one replayed bike and its wakeup state machine.

use rp_core::{EntityId, GeoPoint, MergePolicy, TimerQueue, VirtualTime};
use rp_history::{Movement, WaypointCursor};
use tracing::trace;

use crate::summary::{EntitySummary, TripSummary};
use crate::{AnimationController, MoveContext, MoveOutcome};

/// Where an entity is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityState {
    /// Known, but not woken yet; nothing is drawn.
    Unseen,
    /// Placed and waiting for its next wakeup.
    Idle,
    /// An interpolated move is in flight.
    Moving,
    /// Every waypoint has been replayed.  Terminal under
    /// [`MergePolicy::Append`]; a time-ordered merge of later trips makes the
    /// entity [`Idle`][Self::Idle] again.
    Finished,
}

/// What one call to [`Entity::wakeup`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wakeup {
    /// The cursor was exhausted; the marker is hidden.
    Finished,
    /// First sample: the marker was created at this waypoint.
    Placed { at: VirtualTime },
    /// The marker was sent to the waypoint recorded at `to`.
    Moved {
        to:            VirtualTime,
        duration:      i64,
        /// Overdue waypoints skipped on the way (0 if the entity was on time).
        collapsed:     usize,
        /// The waypoint opened a new trip, so the marker teleported hidden.
        between_trips: bool,
        outcome:       MoveOutcome,
    },
    /// Nothing to consume.
    Idle,
}

/// A replayed entity: its recorded history, its marker, and when it next
/// needs attention.
#[derive(Debug)]
pub struct Entity {
    id:               EntityId,
    cursor:           WaypointCursor,
    animation:        Option<AnimationController>,
    next_wakeup_time: VirtualTime,
    finished:         bool,
}

impl Entity {
    pub fn new(id: EntityId, movements: impl IntoIterator<Item = Movement>) -> Self {
        let cursor = WaypointCursor::new(movements);
        let next_wakeup_time = cursor.next_wakeup();
        Self {
            id,
            cursor,
            animation: None,
            next_wakeup_time,
            finished: false,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// When the scheduler should wake this entity next.
    /// [`VirtualTime::NEVER`] once finished.
    #[inline]
    pub fn next_wakeup_time(&self) -> VirtualTime {
        self.next_wakeup_time
    }

    #[inline]
    pub fn cursor(&self) -> &WaypointCursor {
        &self.cursor
    }

    #[inline]
    pub fn animation(&self) -> Option<&AnimationController> {
        self.animation.as_ref()
    }

    pub fn is_moving(&self) -> bool {
        self.animation.as_ref().is_some_and(AnimationController::is_moving)
    }

    /// Current marker position, once placed.
    pub fn position(&self) -> Option<GeoPoint> {
        self.animation.as_ref().map(AnimationController::position)
    }

    pub fn state(&self) -> EntityState {
        if self.finished {
            EntityState::Finished
        } else if self.animation.is_none() {
            EntityState::Unseen
        } else if self.is_moving() {
            EntityState::Moving
        } else {
            EntityState::Idle
        }
    }

    /// `true` if the scheduler should call [`wakeup`][Self::wakeup] at `now`.
    pub fn is_due(&self, now: VirtualTime) -> bool {
        self.next_wakeup_time <= now && self.next_wakeup_time.is_scheduled() && !self.is_moving()
    }

    /// Merge more recorded movements.  An entity that has not been placed yet
    /// re-derives its first wakeup from the merged data, and so does a
    /// finished one whose cursor the merge resumed.
    pub fn add_movements(&mut self, movements: impl IntoIterator<Item = Movement>, policy: MergePolicy) {
        self.cursor.add_movements(movements, policy);
        if self.finished && !self.cursor.has_finished_history() {
            self.finished = false;
            self.next_wakeup_time = self.cursor.next_wakeup();
            trace!(entity = %self.id, next = %self.next_wakeup_time, "resumed");
        } else if self.animation.is_none() && !self.finished {
            self.next_wakeup_time = self.cursor.next_wakeup();
        }
    }

    /// Discard waypoints strictly older than `time` without drawing them.
    pub fn prune(&mut self, time: VirtualTime) -> usize {
        self.cursor.prune_before(time)
    }

    /// Advance the active move by one sub-step.  Returns `true` when the move
    /// finished.
    pub fn animation_step(&mut self, timers: &mut TimerQueue) -> bool {
        self.animation
            .as_mut()
            .is_some_and(|animation| animation.advance(timers))
    }

    /// Consume recorded waypoints up to `now` and move the marker.
    ///
    /// 1. Exhausted history → hide, `next_wakeup_time = NEVER`, finished.
    /// 2. Take the next waypoint (nothing left → no-op).
    /// 3. First wakeup → create the marker there and show it; no animation.
    /// 4. Every further waypoint already due at `now` is taken too, and only
    ///    the last one is applied, instantly.
    /// 5. Otherwise the move lasts as long as the recorded gap since the
    ///    previous waypoint.
    /// 6. A waypoint that opens a new trip is reached hidden, instantly.
    pub fn wakeup(&mut self, now: VirtualTime, ctx: &mut MoveContext<'_>) -> Wakeup {
        if self.cursor.has_finished_history() {
            self.next_wakeup_time = VirtualTime::NEVER;
            if let Some(animation) = &mut self.animation {
                animation.hide();
            }
            if !self.finished {
                trace!(entity = %self.id, %now, "history finished");
            }
            self.finished = true;
            return Wakeup::Finished;
        }

        let Some(mut current) = self.cursor.next_waypoint() else {
            return Wakeup::Idle;
        };

        let Some(animation) = &mut self.animation else {
            self.next_wakeup_time = current.waypoint.time;
            let mut animation = AnimationController::new(self.id, current.waypoint.position, ctx);
            animation.show();
            self.animation = Some(animation);
            trace!(entity = %self.id, at = %current.waypoint.time, "placed");
            return Wakeup::Placed { at: current.waypoint.time };
        };

        let mut collapsed = 0;
        while self.cursor.peek_next().is_some_and(|next| next.time <= now) {
            match self.cursor.next_waypoint() {
                Some(next) => {
                    current = next;
                    collapsed += 1;
                }
                None => break,
            }
        }

        let duration = if collapsed > 0 {
            0
        } else {
            current.waypoint.time.since(self.next_wakeup_time)
        };
        self.next_wakeup_time = current.waypoint.time;

        let outcome = if current.first_of_movement {
            animation.hide();
            animation.move_to(current.waypoint.position, 0, ctx)
        } else {
            animation.show();
            animation.move_to(current.waypoint.position, duration, ctx)
        };

        trace!(
            entity = %self.id,
            %now,
            to = %current.waypoint.time,
            duration,
            collapsed,
            between_trips = current.first_of_movement,
            "woke"
        );

        Wakeup::Moved {
            to: current.waypoint.time,
            duration,
            collapsed,
            between_trips: current.first_of_movement,
            outcome,
        }
    }

    /// Trip list for display when the entity is selected.
    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            id:       self.id,
            state:    self.state(),
            position: self.position(),
            trips:    self
                .cursor
                .movements()
                .iter()
                .enumerate()
                .map(|(i, m)| TripSummary::from_movement(i + 1, m))
                .collect(),
        }
    }
}
