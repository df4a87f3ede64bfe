//! Topics and payloads published on the scheduler's event bus.

use chrono::{DateTime, Utc};

use rp_core::VirtualTime;
use rp_entity::EntitySummary;

/// What a handler subscribes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// After every scheduler tick.
    Clock,
    /// A chunk was parsed and merged into the registry.
    LoadedChunk,
    /// `select_entity` was called.
    EntitySelected,
    /// A chunk could not be fetched or parsed.
    FetchFailed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplayEvent {
    Clock {
        counter:   VirtualTime,
        timestamp: DateTime<Utc>,
    },
    LoadedChunk {
        file_name: String,
        entities:  usize,
    },
    EntitySelected(EntitySummary),
    FetchFailed {
        resource: String,
        reason:   String,
    },
}

impl ReplayEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ReplayEvent::Clock { .. }          => Topic::Clock,
            ReplayEvent::LoadedChunk { .. }    => Topic::LoadedChunk,
            ReplayEvent::EntitySelected(_)     => Topic::EntitySelected,
            ReplayEvent::FetchFailed { .. }    => Topic::FetchFailed,
        }
    }
}
