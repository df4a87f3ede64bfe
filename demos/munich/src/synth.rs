//! Synthetic bike-sharing dataset around central Munich.
//!
//! Produces the same manifest + chunk layout the replayer reads from disk:
//! three one-hour chunks, each bike riding zero to two short trips per hour
//! as a random walk from its last dock.  Every bike has its own `SmallRng`
//! so adding bikes does not change the trips of existing ones.

use std::path::Path;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rp_data::{
    ChunkDescriptor, ChunkPayload, Manifest, MemoryFetcher, RawEntity, RawInstant, RawMovement,
    RawWaypoint,
};

const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Marienplatz.
const CENTER:       (f64, f64) = (11.5755, 48.1374);
const START_TIME:   i64        = 1_400_000_000;
const CHUNK_SECS:   i64        = 3_600;
const CHUNK_COUNT:  i64        = 3;
/// Degrees per waypoint, roughly 150 m.
const STEP_DEG:     f64        = 0.0015;

pub struct Dataset {
    pub manifest: Manifest,
    pub chunks:   Vec<(String, ChunkPayload)>,
}

impl Dataset {
    /// Serve the dataset from memory, with the manifest under `manifest_resource`.
    pub fn into_fetcher(self, manifest_resource: &str) -> Result<MemoryFetcher> {
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert(manifest_resource, serde_json::to_vec(&self.manifest)?);
        for (name, payload) in self.chunks {
            fetcher.insert(name, serde_json::to_vec(&payload)?);
        }
        Ok(fetcher)
    }

    /// Write `data.json` and the chunk files into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("data.json"), serde_json::to_vec_pretty(&self.manifest)?)?;
        for (name, payload) in &self.chunks {
            std::fs::write(dir.join(name), serde_json::to_vec(payload)?)?;
        }
        Ok(())
    }
}

pub fn generate(bikes: u32, seed: u64) -> Dataset {
    let mut docks: Vec<(f64, f64)> = Vec::with_capacity(bikes as usize);
    let mut rngs: Vec<SmallRng> = (0..bikes)
        .map(|id| SmallRng::seed_from_u64(seed ^ (id as u64).wrapping_mul(MIXING_CONSTANT)))
        .collect();
    for rng in &mut rngs {
        docks.push((
            CENTER.0 + rng.gen_range(-0.02..0.02),
            CENTER.1 + rng.gen_range(-0.012..0.012),
        ));
    }

    let mut time_chunks = Vec::new();
    let mut chunks = Vec::new();

    for c in 0..CHUNK_COUNT {
        let start = START_TIME + c * CHUNK_SECS;
        let end = start + CHUNK_SECS;
        let file_name = format!("chunk-{c}.json");

        let mut entities = Vec::new();
        for (id, rng) in rngs.iter_mut().enumerate() {
            let trips = rng.gen_range(0..=2);
            if trips == 0 {
                continue;
            }
            let mut movements = Vec::new();
            let mut t = start + rng.gen_range(0..CHUNK_SECS / 4);
            for _ in 0..trips {
                if t >= end - 600 {
                    break;
                }
                // The real feed has holes; the loader skips them.
                if rng.gen_bool(0.1) {
                    movements.push(None);
                }
                let movement = ride(rng, &mut docks[id], t);
                t = movement.to.time + rng.gen_range(300..900);
                movements.push(Some(movement));
            }
            entities.push(RawEntity { id: id as u32, movements });
        }

        time_chunks.push(ChunkDescriptor {
            file_name:  file_name.clone(),
            start_time: rp_core::VirtualTime(start),
            last_time:  rp_core::VirtualTime(end),
        });
        chunks.push((file_name, ChunkPayload { bikes: entities }));
    }

    Dataset { manifest: Manifest { time_chunks }, chunks }
}

/// One trip starting at `dock` at time `t`; leaves `dock` at the end point.
fn ride(rng: &mut SmallRng, dock: &mut (f64, f64), t: i64) -> RawMovement {
    let legs = rng.gen_range(3..8);
    let heading: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

    let mut time = t;
    let mut waypoints = Vec::with_capacity(legs + 1);
    waypoints.push(RawWaypoint { time, lng: dock.0, lat: dock.1 });
    for _ in 0..legs {
        let turn: f64 = rng.gen_range(-0.6..0.6);
        time += rng.gen_range(30..120);
        dock.0 += STEP_DEG * (heading + turn).cos();
        dock.1 += STEP_DEG * 0.67 * (heading + turn).sin();
        waypoints.push(RawWaypoint { time, lng: dock.0, lat: dock.1 });
    }

    RawMovement {
        from:     RawInstant { time: t },
        to:       RawInstant { time },
        duration: time - t,
        waypoints,
    }
}
