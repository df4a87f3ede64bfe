//! `ChunkFetcher`: where manifest and chunk bytes come from.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::{DataError, DataResult};

/// Source of named resources (the manifest and the chunk files it lists).
pub trait ChunkFetcher {
    fn fetch(&mut self, resource: &str) -> DataResult<Vec<u8>>;
}

impl<F: ChunkFetcher + ?Sized> ChunkFetcher for &mut F {
    fn fetch(&mut self, resource: &str) -> DataResult<Vec<u8>> {
        (**self).fetch(resource)
    }
}

impl<F: ChunkFetcher + ?Sized> ChunkFetcher for Box<F> {
    fn fetch(&mut self, resource: &str) -> DataResult<Vec<u8>> {
        (**self).fetch(resource)
    }
}

// ── DirFetcher ────────────────────────────────────────────────────────────────

/// Reads resources as files relative to a data directory.
#[derive(Clone, Debug)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChunkFetcher for DirFetcher {
    fn fetch(&mut self, resource: &str) -> DataResult<Vec<u8>> {
        let path = self.root.join(resource);
        trace!(path = %path.display(), "reading resource");
        std::fs::read(&path).map_err(|source| DataError::Fetch {
            resource: resource.to_owned(),
            source,
        })
    }
}

// ── MemoryFetcher ─────────────────────────────────────────────────────────────

/// Serves resources from memory and remembers what was asked for.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, Vec<u8>>,
    requests:  Vec<String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`][Self::insert].
    pub fn with(mut self, resource: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(resource, bytes);
        self
    }

    pub fn insert(&mut self, resource: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(resource.into(), bytes.into());
    }

    pub fn remove(&mut self, resource: &str) -> Option<Vec<u8>> {
        self.resources.remove(resource)
    }

    /// Every resource requested so far, in order, including failed ones.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl ChunkFetcher for MemoryFetcher {
    fn fetch(&mut self, resource: &str) -> DataResult<Vec<u8>> {
        self.requests.push(resource.to_owned());
        self.resources.get(resource).cloned().ok_or_else(|| DataError::Fetch {
            resource: resource.to_owned(),
            source:   io::Error::new(io::ErrorKind::NotFound, "no such resource"),
        })
    }
}
