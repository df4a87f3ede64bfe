//! `rp-data` — getting recorded movements off disk (or the wire) and into
//! domain types.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`schema`]   | `Manifest`, `ChunkDescriptor`, wire structs, `ChunkData`      |
//! | [`fetch`]    | `ChunkFetcher` trait, `DirFetcher`, `MemoryFetcher`           |
//! | [`loader`]   | `ChunkLoader` — ordered, at-most-once chunk queue             |
//! | [`error`]    | `DataError`, `DataResult<T>`                                  |
//!
//! Fetching is a plain synchronous call; the scheduler decides when a
//! requested chunk is actually fetched and applied.

pub mod error;
pub mod fetch;
pub mod loader;
pub mod schema;


pub use error::{DataError, DataResult};
pub use fetch::{ChunkFetcher, DirFetcher, MemoryFetcher};
pub use loader::ChunkLoader;
pub use schema::{
    ChunkData, ChunkDescriptor, ChunkPayload, EntityMovements, Manifest, RawEntity, RawInstant,
    RawMovement, RawWaypoint,
};
