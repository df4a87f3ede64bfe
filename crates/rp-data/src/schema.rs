//! Wire schema for the manifest and chunk payloads, plus strict conversion
//! into domain types.
//!
//! # Manifest
//!
//! ```json
//! { "timeChunks": [ { "fileName": "chunk-0.json", "startTime": 1000, "lastTime": 2000 } ] }
//! ```
//!
//! # Chunk payload
//!
//! ```json
//! { "bikes": [ { "id": 5, "movements": [ null, {
//!     "from": { "time": 1000 }, "to": { "time": 1100 }, "duration": 100,
//!     "waypoints": [ { "time": 1000, "lng": 11.55, "lat": 48.13 }, ... ] } ] } ] }
//! ```
//!
//! `null` movements are skipped.  Anything else that does not fit (missing
//! fields, wrong types, empty or time-decreasing waypoint lists) rejects the
//! whole chunk, so nothing from it is ever applied.

use serde::{Deserialize, Serialize};

use rp_core::{EntityId, GeoPoint, VirtualTime};
use rp_history::{Movement, Waypoint};

use crate::{DataError, DataResult};

// ── Manifest ──────────────────────────────────────────────────────────────────

/// One chunk as listed in the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDescriptor {
    pub file_name:  String,
    pub start_time: VirtualTime,
    pub last_time:  VirtualTime,
}

/// Entry file listing every chunk of the dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub time_chunks: Vec<ChunkDescriptor>,
}

impl Manifest {
    /// Parse and validate a manifest: at least one chunk, sorted by
    /// `startTime`.
    pub fn from_slice(bytes: &[u8]) -> DataResult<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)
            .map_err(|e| DataError::MalformedManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.time_chunks.is_empty() {
            return Err(DataError::MalformedManifest("no chunks listed".into()));
        }
        if let Some(pair) = self
            .time_chunks
            .windows(2)
            .find(|w| w[1].start_time < w[0].start_time)
        {
            return Err(DataError::MalformedManifest(format!(
                "`{}` starts at {} before `{}` at {}",
                pair[1].file_name, pair[1].start_time, pair[0].file_name, pair[0].start_time,
            )));
        }
        Ok(())
    }

    /// Start of the earliest chunk.
    pub fn first_start_time(&self) -> Option<VirtualTime> {
        self.time_chunks.first().map(|c| c.start_time)
    }
}

// ── Chunk payload (wire) ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub bikes: Vec<RawEntity>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEntity {
    pub id:        u32,
    pub movements: Vec<Option<RawMovement>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawMovement {
    pub from:      RawInstant,
    pub to:        RawInstant,
    pub duration:  i64,
    pub waypoints: Vec<RawWaypoint>,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RawInstant {
    pub time: i64,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RawWaypoint {
    pub time: i64,
    pub lng:  f64,
    pub lat:  f64,
}

impl RawMovement {
    fn into_movement(self) -> Result<Movement, rp_history::HistoryError> {
        let waypoints = self
            .waypoints
            .into_iter()
            .map(|w| Waypoint::new(VirtualTime(w.time), GeoPoint::new(w.lng, w.lat)))
            .collect();
        Movement::new(
            VirtualTime(self.from.time),
            VirtualTime(self.to.time),
            self.duration,
            waypoints,
        )
    }
}

// ── Chunk data (domain) ───────────────────────────────────────────────────────

/// Movements for one entity from one chunk, in file order.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityMovements {
    pub id:        EntityId,
    pub movements: Vec<Movement>,
}

/// A fully validated chunk, ready to be merged into the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkData {
    pub descriptor: ChunkDescriptor,
    pub entities:   Vec<EntityMovements>,
}

impl ChunkData {
    /// Parse a chunk payload.  Fails as a whole on the first problem.
    pub fn parse(descriptor: ChunkDescriptor, bytes: &[u8]) -> DataResult<Self> {
        let malformed = |reason: String| DataError::MalformedChunk {
            resource: descriptor.file_name.clone(),
            reason,
        };

        let payload: ChunkPayload =
            serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;

        let mut entities = Vec::with_capacity(payload.bikes.len());
        for raw in payload.bikes {
            let movements = raw
                .movements
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, m)| {
                    m.into_movement()
                        .map_err(|e| malformed(format!("entity {} movement {i}: {e}", raw.id)))
                })
                .collect::<DataResult<Vec<_>>>()?;
            entities.push(EntityMovements { id: EntityId(raw.id), movements });
        }

        Ok(Self { descriptor, entities })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
