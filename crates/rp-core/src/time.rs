//! Replay time model.
//!
//! # Design
//!
//! Two clocks coexist:
//!
//! - [`VirtualTime`] is the simulated clock: whole seconds since the Unix
//!   epoch, the same unit the recorded traces use.  It is advanced in
//!   `step_size` increments by the scheduler and never moves backward while
//!   the scheduler runs.
//! - [`WallTime`] is the (real or simulated) wall clock that drives the tick
//!   timer and the per-entity interpolation timers.  It is kept in
//!   microseconds so sub-step intervals like `13.33 ms` stay exact enough
//!   that a move of `N` sub-steps ends on schedule.
//!
//! Keeping virtual time an integer means every schedule comparison is exact.

use std::fmt;

use chrono::{DateTime, Utc};

// ── VirtualTime ───────────────────────────────────────────────────────────────

/// A point on the simulated clock, in seconds since the Unix epoch.
///
/// Signed so that the "no further events" sentinel [`VirtualTime::NEVER`]
/// (`-1`) is representable, matching the wire format.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VirtualTime(pub i64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Sentinel for "no further events".  Never satisfies `is_scheduled`.
    pub const NEVER: VirtualTime = VirtualTime(-1);

    /// `true` for real event times.  The scheduler only wakes entities whose
    /// wakeup time is strictly positive.
    #[inline]
    pub fn is_scheduled(self) -> bool {
        self.0 > 0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: VirtualTime) -> i64 {
        self.0 - earlier.0
    }

    /// Wall-clock date for display.  Out-of-range values clamp to the epoch.
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

impl std::ops::Add<i64> for VirtualTime {
    type Output = VirtualTime;
    #[inline]
    fn add(self, rhs: i64) -> VirtualTime {
        VirtualTime(self.0 + rhs)
    }
}

impl std::ops::Sub<i64> for VirtualTime {
    type Output = VirtualTime;
    #[inline]
    fn sub(self, rhs: i64) -> VirtualTime {
        VirtualTime(self.0 - rhs)
    }
}

impl std::ops::Sub for VirtualTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: VirtualTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

// ── WallTime ──────────────────────────────────────────────────────────────────

/// Microseconds of wall-clock time since the replay was constructed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct WallTime(pub u64);

impl WallTime {
    pub const ZERO: WallTime = WallTime(0);

    #[inline]
    pub fn from_millis(ms: u64) -> WallTime {
        WallTime(ms * 1_000)
    }

    /// Convert fractional milliseconds, rounding to the nearest microsecond.
    /// Never returns less than one microsecond so repeating timers progress.
    #[inline]
    pub fn from_millis_f64(ms: f64) -> WallTime {
        WallTime(((ms * 1_000.0).round() as u64).max(1))
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_micros(self.0)
    }

    #[inline]
    pub fn saturating_sub(self, rhs: WallTime) -> WallTime {
        WallTime(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Add for WallTime {
    type Output = WallTime;
    #[inline]
    fn add(self, rhs: WallTime) -> WallTime {
        WallTime(self.0 + rhs.0)
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}ms", self.0 / 1_000, self.0 % 1_000)
    }
}
