//! `AnimationController`: smooth marker movement for one entity.
//!
//! A move from `source` to `target` lasting `duration` virtual seconds is
//! split into `N` sub-steps (`ReplayConfig::smoothing_ticks`).  The
//! sub-steps run as one repeating task in the scheduler's [`TimerQueue`],
//! spaced so that all `N` take as long in wall time as the clock needs to
//! cover `duration`.  Sub-step `k` places the marker at
//! `source + (k / N) · (target − source)`; the last one snaps exactly onto
//! `target` and cancels the task.

use rp_core::{EntityId, GeoPoint, ReplayConfig, TaskId, TimerQueue, TimerTarget, WallTime};
use tracing::trace;

use crate::{Marker, PathTrace, Renderer};

/// Everything a wakeup or move needs from the scheduler, borrowed for the
/// duration of one call.
pub struct MoveContext<'a> {
    pub config:   &'a ReplayConfig,
    pub renderer: &'a mut dyn Renderer,
    pub timers:   &'a mut TimerQueue,
    /// Current wall time; sub-step timers are armed relative to it.
    pub now:      WallTime,
}

/// Result of [`AnimationController::move_to`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Another move is still running; nothing changed.
    Rejected,
    /// Position applied immediately.
    Instant,
    /// Interpolation scheduled as this timer task.
    Animating(TaskId),
}

/// Interpolation state and render handles for one entity.
pub struct AnimationController {
    entity:      EntityId,
    position:    GeoPoint,
    source:      GeoPoint,
    target:      GeoPoint,
    step:        u32,
    total_steps: u32,
    active:      Option<TaskId>,
    hidden:      bool,
    marker:      Option<Box<dyn Marker>>,
    trace:       Option<Box<dyn PathTrace>>,
}

impl AnimationController {
    /// Create the controller at `at`.  Marker and trace are only created if
    /// the config asks for them.  The marker starts hidden.
    pub fn new(entity: EntityId, at: GeoPoint, ctx: &mut MoveContext<'_>) -> Self {
        let marker = ctx
            .config
            .draw_markers
            .then(|| ctx.renderer.create_marker(entity, at));
        let trace = ctx
            .config
            .draw_lines
            .then(|| ctx.renderer.create_trace(entity, at));

        let mut controller = Self {
            entity,
            position: at,
            source: at,
            target: at,
            step: 0,
            total_steps: 0,
            active: None,
            hidden: false,
            marker,
            trace,
        };
        controller.hide();
        controller
    }

    /// `true` while an interpolation is in flight.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    /// Last position applied to the marker.
    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// The timer task driving the current move, if any.
    #[inline]
    pub fn active_task(&self) -> Option<TaskId> {
        self.active
    }

    pub fn show(&mut self) {
        if !self.hidden {
            return;
        }
        if let Some(marker) = &mut self.marker {
            marker.show();
        }
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        if self.hidden {
            return;
        }
        if let Some(marker) = &mut self.marker {
            marker.hide();
        }
        self.hidden = true;
    }

    /// Start moving to `target` over `duration` virtual seconds.
    ///
    /// Rejected while another move runs.  A zero duration, or a 1 ms render
    /// loop, applies the position at once.
    pub fn move_to(&mut self, target: GeoPoint, duration: i64, ctx: &mut MoveContext<'_>) -> MoveOutcome {
        if self.active.is_some() {
            return MoveOutcome::Rejected;
        }

        let source = self.position;
        if let Some(trace) = &mut self.trace {
            trace.append_point(source);
        }

        if duration <= 0 || ctx.config.is_instant() {
            self.apply(target);
            return MoveOutcome::Instant;
        }

        let interval = ctx.config.sub_step_interval(duration);
        let task = ctx.timers.schedule_repeating(
            ctx.now + interval,
            interval,
            TimerTarget::Animation(self.entity),
        );
        self.source = source;
        self.target = target;
        self.step = 0;
        self.total_steps = ctx.config.smoothing_ticks();
        self.active = Some(task);

        trace!(entity = %self.entity, %source, %target, duration, %interval, "animating move");
        MoveOutcome::Animating(task)
    }

    /// Run one interpolation sub-step.  Returns `true` when the move
    /// completed on this step.  A call without an active move is a no-op.
    pub fn advance(&mut self, timers: &mut TimerQueue) -> bool {
        let Some(task) = self.active else {
            return false;
        };

        self.step += 1;
        if self.step >= self.total_steps {
            let target = self.target;
            self.apply(target);
            timers.cancel(task);
            self.active = None;
            return true;
        }

        let t = self.step as f64 / self.total_steps as f64;
        let position = self.source.lerp(self.target, t);
        self.apply(position);
        false
    }

    fn apply(&mut self, position: GeoPoint) {
        if let Some(marker) = &mut self.marker {
            marker.move_to(position);
        }
        if let Some(trace) = &mut self.trace {
            trace.update_last_point(position);
        }
        self.position = position;
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("entity", &self.entity)
            .field("position", &self.position)
            .field("step", &self.step)
            .field("total_steps", &self.total_steps)
            .field("active", &self.active)
            .field("hidden", &self.hidden)
            .finish()
    }
}
