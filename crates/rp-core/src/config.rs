//! Replay configuration.
//!
//! Typically loaded from a JSON file by the application and handed to the
//! scheduler builder.  Every field has a default matching the reference
//! deployment (100 ms render loop, 15 s clock step).

use serde::Deserialize;

use crate::{CoreError, CoreResult, VirtualTime, WallTime};

/// How merged movements are placed relative to the ones already held by an
/// entity's waypoint cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Append in arrival order; never re-sort.
    #[default]
    Append,
    /// Insert each merged movement into the not-yet-started tail so the tail
    /// stays ordered by start time.
    TimeOrdered,
}

/// Top-level replay configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Wall-clock interval between scheduler ticks, in milliseconds.
    pub speed_ms: u32,

    /// Virtual seconds the clock advances per tick.
    pub step_size: i64,

    /// Interpolation sub-steps per animated move.  `None` derives
    /// `max(1, round(speed_ms / 2))`.
    pub smoothing_ticks: Option<u32>,

    /// Chunks are requested this many ticks' worth of rendered time ahead of
    /// their start.
    pub prefetch_steps: u32,

    /// Create and move markers through the renderer.
    pub draw_markers: bool,

    /// Maintain a path trace per entity.
    pub draw_lines: bool,

    pub merge_policy: MergePolicy,

    /// Resource name of the chunk manifest, relative to the fetcher root.
    pub manifest_resource: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_ms:          100,
            step_size:         15,
            smoothing_ticks:   None,
            prefetch_steps:    10,
            draw_markers:      true,
            draw_lines:        true,
            merge_policy:      MergePolicy::Append,
            manifest_resource: "data.json".to_string(),
        }
    }
}

impl ReplayConfig {
    /// Parse a JSON config document.  Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let config: ReplayConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.speed_ms == 0 {
            return Err(CoreError::Config("speed_ms must be at least 1".into()));
        }
        if self.step_size <= 0 {
            return Err(CoreError::Config(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if self.prefetch_steps == 0 {
            return Err(CoreError::Config("prefetch_steps must be at least 1".into()));
        }
        if self.smoothing_ticks == Some(0) {
            return Err(CoreError::Config("smoothing_ticks must be at least 1".into()));
        }
        if self.manifest_resource.is_empty() {
            return Err(CoreError::Config("manifest_resource is empty".into()));
        }
        Ok(())
    }

    /// Sub-steps per animated move.
    pub fn smoothing_ticks(&self) -> u32 {
        self.smoothing_ticks
            .unwrap_or_else(|| ((self.speed_ms as f64 / 2.0).round() as u32).max(1))
    }

    /// Virtual seconds of lookahead used for chunk prefetch:
    /// `prefetch_steps * step_size * (1000 / speed_ms)`.
    ///
    /// At the defaults this is `10 * 15 * 10 = 1500` s.
    pub fn lookahead(&self) -> i64 {
        (self.prefetch_steps as f64 * self.step_size as f64 * (1000.0 / self.speed_ms as f64))
            .round() as i64
    }

    /// A 1 ms render loop is too fast to animate; moves snap instantly.
    #[inline]
    pub fn is_instant(&self) -> bool {
        self.speed_ms == 1
    }

    /// Interval of the scheduler tick timer.
    #[inline]
    pub fn tick_interval(&self) -> WallTime {
        WallTime::from_millis(self.speed_ms as u64)
    }

    /// Interval between interpolation sub-steps for a move lasting
    /// `duration` virtual seconds: `duration * speed_ms / step_size / N` ms.
    ///
    /// `N` sub-steps at this interval take as long in wall time as the
    /// scheduler needs to advance the clock by `duration`.
    pub fn sub_step_interval(&self, duration: i64) -> WallTime {
        let ms = duration as f64 * self.speed_ms as f64
            / self.step_size as f64
            / self.smoothing_ticks() as f64;
        WallTime::from_millis_f64(ms)
    }

    /// The clock value `load_data` starts from: just over one step before
    /// the first chunk.
    #[inline]
    pub fn initial_counter(&self, first_chunk_start: VirtualTime) -> VirtualTime {
        first_chunk_start - self.step_size - 1
    }
}
