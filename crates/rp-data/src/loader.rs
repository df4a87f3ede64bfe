//! `ChunkLoader`: hands out the manifest's chunks in order, once each.
//!
//! The loader owns the queue of chunks not yet requested.  Popping the final
//! descriptor fixes [`last_time`][ChunkLoader::last_time], the end bound of
//! the whole replay.  A popped chunk is never re-queued, so a chunk whose
//! fetch fails is skipped for the rest of the run.

use std::collections::VecDeque;

use rp_core::VirtualTime;
use tracing::{debug, warn};

use crate::{ChunkData, ChunkDescriptor, ChunkFetcher, DataResult, Manifest};

#[derive(Clone, Debug, Default)]
pub struct ChunkLoader {
    pending:   VecDeque<ChunkDescriptor>,
    last_time: Option<VirtualTime>,
}

impl ChunkLoader {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            pending:   manifest.time_chunks.into(),
            last_time: None,
        }
    }

    /// Fetch and validate the manifest named `resource`.
    pub fn fetch_manifest<F: ChunkFetcher + ?Sized>(fetcher: &mut F, resource: &str) -> DataResult<Manifest> {
        let bytes = fetcher.fetch(resource)?;
        let manifest = Manifest::from_slice(&bytes)?;
        debug!(resource, chunks = manifest.time_chunks.len(), "manifest fetched");
        Ok(manifest)
    }

    /// Fetch and strictly parse one chunk.
    pub fn fetch_chunk<F: ChunkFetcher + ?Sized>(
        fetcher: &mut F,
        descriptor: ChunkDescriptor,
    ) -> DataResult<ChunkData> {
        let bytes = fetcher.fetch(&descriptor.file_name)?;
        let chunk = ChunkData::parse(descriptor, &bytes)?;
        debug!(
            file = %chunk.descriptor.file_name,
            entities = chunk.entity_count(),
            "chunk parsed"
        );
        Ok(chunk)
    }

    /// `true` if the next pending chunk starts within `lookahead` seconds
    /// of `current`.
    pub fn should_prefetch(&self, current: VirtualTime, lookahead: i64) -> bool {
        self.pending
            .front()
            .is_some_and(|head| current + lookahead >= head.start_time)
    }

    /// Pop the next chunk to request.  Popping the last one records its
    /// `lastTime` as the end bound.
    pub fn begin_next(&mut self) -> Option<ChunkDescriptor> {
        let descriptor = self.pending.pop_front()?;
        if self.pending.is_empty() {
            self.last_time = Some(descriptor.last_time);
        }
        debug!(
            file = %descriptor.file_name,
            start = %descriptor.start_time,
            remaining = self.pending.len(),
            "chunk requested"
        );
        Some(descriptor)
    }

    /// [`begin_next`][Self::begin_next] followed by a blocking fetch.
    /// `Ok(None)` once every chunk has been requested.
    pub fn load_next<F: ChunkFetcher + ?Sized>(&mut self, fetcher: &mut F) -> DataResult<Option<ChunkData>> {
        let Some(descriptor) = self.begin_next() else {
            return Ok(None);
        };
        let file = descriptor.file_name.clone();
        match Self::fetch_chunk(fetcher, descriptor) {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) => {
                warn!(%file, error = %e, "chunk load failed");
                Err(e)
            }
        }
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The next chunk that would be requested.
    pub fn peek_next(&self) -> Option<&ChunkDescriptor> {
        self.pending.front()
    }

    /// End bound of the replay; known once the final chunk was requested.
    #[inline]
    pub fn last_time(&self) -> Option<VirtualTime> {
        self.last_time
    }

    /// `true` once every chunk has been requested.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}
