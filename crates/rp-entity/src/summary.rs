//! Read-only summaries published when an entity is selected.

use std::fmt;

use rp_core::{EntityId, GeoPoint, VirtualTime};
use rp_history::Movement;

use crate::EntityState;

/// One recorded trip.
#[derive(Clone, Debug, PartialEq)]
pub struct TripSummary {
    /// 1-based position among the entity's trips.
    pub index:      usize,
    pub start_time: VirtualTime,
    pub end_time:   VirtualTime,
    /// Recorded duration in seconds.
    pub duration:   i64,
    /// Length of the recorded path in metres.
    pub distance_m: f64,
    pub waypoints:  usize,
}

impl TripSummary {
    pub fn from_movement(index: usize, movement: &Movement) -> Self {
        Self {
            index,
            start_time: movement.start_time(),
            end_time:   movement.end_time(),
            duration:   movement.duration(),
            distance_m: movement.distance_m(),
            waypoints:  movement.waypoints().len(),
        }
    }
}

impl fmt::Display for TripSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trip {} : {}", self.index, self.duration)
    }
}

/// Snapshot of an entity for a detail panel.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySummary {
    pub id:       EntityId,
    pub state:    EntityState,
    pub position: Option<GeoPoint>,
    pub trips:    Vec<TripSummary>,
}

impl EntitySummary {
    /// Sum of recorded trip durations, in seconds.
    pub fn total_duration(&self) -> i64 {
        self.trips.iter().map(|t| t.duration).sum()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.trips.iter().map(|t| t.distance_m).sum()
    }
}
