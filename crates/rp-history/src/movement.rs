//! Immutable recorded trips.

use rp_core::{GeoPoint, VirtualTime};

use crate::{HistoryError, HistoryResult};

/// One timestamped position sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub time:     VirtualTime,
    pub position: GeoPoint,
}

impl Waypoint {
    #[inline]
    pub fn new(time: VirtualTime, position: GeoPoint) -> Self {
        Self { time, position }
    }
}

/// One continuous trip: an ordered, non-empty list of waypoints plus the
/// start/end/duration recorded alongside it.
///
/// The recorded bounds are kept as-is rather than derived from the
/// waypoints; the first wakeup of a fresh entity is keyed on `start_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct Movement {
    start_time: VirtualTime,
    end_time:   VirtualTime,
    duration:   i64,
    waypoints:  Vec<Waypoint>,
}

impl Movement {
    /// Build a movement, rejecting empty or time-decreasing waypoint lists.
    pub fn new(
        start_time: VirtualTime,
        end_time:   VirtualTime,
        duration:   i64,
        waypoints:  Vec<Waypoint>,
    ) -> HistoryResult<Self> {
        if waypoints.is_empty() {
            return Err(HistoryError::EmptyMovement);
        }
        if let Some(pair) = waypoints.windows(2).find(|w| w[1].time < w[0].time) {
            return Err(HistoryError::UnorderedWaypoints {
                earlier: pair[0].time,
                later:   pair[1].time,
            });
        }
        Ok(Self { start_time, end_time, duration, waypoints })
    }

    /// Build a movement whose bounds are taken from its first and last
    /// waypoints.
    pub fn from_waypoints(waypoints: Vec<Waypoint>) -> HistoryResult<Self> {
        let (Some(first), Some(last)) = (waypoints.first(), waypoints.last()) else {
            return Err(HistoryError::EmptyMovement);
        };
        let (start, end) = (first.time, last.time);
        Self::new(start, end, end - start, waypoints)
    }

    #[inline]
    pub fn start_time(&self) -> VirtualTime {
        self.start_time
    }

    #[inline]
    pub fn end_time(&self) -> VirtualTime {
        self.end_time
    }

    /// Recorded trip duration in seconds.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.duration
    }

    #[inline]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Length of the recorded path in metres.
    pub fn distance_m(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].position.distance_m(w[1].position))
            .sum()
    }
}
