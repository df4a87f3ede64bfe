use rp_core::VirtualTime;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("movement has no waypoints")]
    EmptyMovement,

    #[error("waypoint at {later} precedes the previous waypoint at {earlier}")]
    UnorderedWaypoints {
        earlier: VirtualTime,
        later:   VirtualTime,
    },
}

pub type HistoryResult<T> = Result<T, HistoryError>;
