//! In-memory blob store, for tests and for short-lived scratch files.

use crate::backend::BlobStore;
use crate::error::{Error, Result};
use crate::key;
use crate::path::{BlobStorePath, SEPARATOR};
use bytes::Bytes;
use diagnostics::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Blob handle of [`MemoryBlobStore`]. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    key: String,
    data: Bytes,
}

/// Counts of backend calls, so tests can tell which calls reached the
/// store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub lists: u64,
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
    pub closes: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    // container -> key -> bytes
    containers: HashMap<String, BTreeMap<String, Bytes>>,
    stats: MemoryStoreStats,
}

/// Blob store holding everything in a map per container.
///
/// By default directories are virtual. With [`MemoryBlobStore::with_directory_markers`]
/// `create_directory` stores an empty `dir/` key and only containers and
/// directories with a marker exist.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    state: Mutex<MemoryState>,
    directory_markers: bool,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_directory_markers() -> Self {
        Self {
            directory_markers: true,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn stats(&self) -> MemoryStoreStats {
        self.state().stats
    }

    /// All keys of `container` in key order.
    #[must_use]
    pub fn keys(&self, container: &str) -> Vec<String> {
        self.state()
            .containers
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Store a raw key, bypassing the connector. Lets tests plant foreign
    /// or malformed keys.
    pub fn insert_raw<K: Into<String>>(&self, container: &str, key: K, data: &[u8]) {
        _ = self
            .state()
            .containers
            .entry(container.to_string())
            .or_default()
            .insert(key.into(), Bytes::copy_from_slice(data));
    }
}

/// Keys of `blobs` starting with `prefix`.
fn keys_with_prefix<'a>(
    blobs: &'a BTreeMap<String, Bytes>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a String, &'a Bytes)> + 'a {
    blobs
        .range(prefix.to_string()..)
        .take_while(move |(k, _)| k.starts_with(prefix))
}

impl BlobStore for MemoryBlobStore {
    type Blob = MemoryBlob;

    fn blob_key<'b>(&self, blob: &'b MemoryBlob) -> &'b str {
        &blob.key
    }

    fn blob_size(&self, blob: &MemoryBlob) -> u64 {
        blob.data.len() as u64
    }

    fn blobs(&self, file: &BlobStorePath) -> Result<Vec<MemoryBlob>> {
        let prefix = key::blob_key_prefix(file);
        let mut state = self.state();
        state.stats.lists += 1;
        let Some(blobs) = state.containers.get(file.container()) else {
            return Ok(Vec::new());
        };
        Ok(keys_with_prefix(blobs, &prefix)
            .filter(|(k, _)| key::matches_blob_prefix(&prefix, k))
            .map(|(k, data)| MemoryBlob {
                key: k.clone(),
                data: data.clone(),
            })
            .collect())
    }

    fn child_keys(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        let prefix = key::child_prefix(directory);
        let mut state = self.state();
        state.stats.lists += 1;
        let Some(blobs) = state.containers.get(directory.container()) else {
            return Ok(Vec::new());
        };

        // emulate a delimiter listing: deeper keys collapse into their
        // first directory below the prefix
        let mut children = BTreeSet::new();
        for (k, _) in keys_with_prefix(blobs, &prefix) {
            let rest = &k[prefix.len()..];
            if rest.is_empty() {
                continue;
            }
            let child = match rest.find(SEPARATOR) {
                Some(end) => format!("{prefix}{}", &rest[..=end]),
                None => k.clone(),
            };
            _ = children.insert(child);
        }
        Ok(children.into_iter().collect())
    }

    fn delete_blobs(&self, file: &BlobStorePath, blobs: &[MemoryBlob]) -> Result<bool> {
        let mut state = self.state();
        state.stats.deletes += 1;
        let Some(stored) = state.containers.get_mut(file.container()) else {
            return Ok(blobs.is_empty());
        };
        let mut all_deleted = true;
        for blob in blobs {
            all_deleted &= stored.remove(&blob.key).is_some();
        }
        debug!("Deleted {count} blobs of {path}",
               count: blobs.len(), path: file.full_qualified_name());
        Ok(all_deleted)
    }

    fn read_blob(
        &self,
        file: &BlobStorePath,
        blob: &MemoryBlob,
        offset: u64,
        target: &mut [u8],
    ) -> Result<()> {
        self.state().stats.reads += 1;
        let start = usize::try_from(offset)
            .ok()
            .filter(|start| start + target.len() <= blob.data.len())
            .ok_or_else(|| {
                Error::backend(
                    file,
                    format!(
                        "range {offset}+{} outside blob {} of {} bytes",
                        target.len(),
                        blob.key,
                        blob.data.len()
                    ),
                )
            })?;
        target.copy_from_slice(&blob.data[start..start + target.len()]);
        Ok(())
    }

    fn write_blob(&self, file: &BlobStorePath, key: &str, buffers: &[&[u8]]) -> Result<()> {
        let data = Bytes::from(buffers.concat());
        let mut state = self.state();
        state.stats.writes += 1;
        _ = state
            .containers
            .entry(file.container().to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    fn directory_exists(&self, directory: &BlobStorePath) -> Result<bool> {
        if !self.directory_markers {
            return Ok(true);
        }
        if directory.is_container() {
            return Ok(true);
        }
        let marker = key::child_prefix(directory);
        let mut state = self.state();
        state.stats.lists += 1;
        Ok(state
            .containers
            .get(directory.container())
            .is_some_and(|blobs| blobs.contains_key(&marker)))
    }

    fn create_directory(&self, directory: &BlobStorePath) -> Result<bool> {
        if !self.directory_markers {
            return Ok(true);
        }
        let marker = key::child_prefix(directory);
        let mut state = self.state();
        state.stats.writes += 1;
        let blobs = state
            .containers
            .entry(directory.container().to_string())
            .or_default();
        if !marker.is_empty() {
            _ = blobs.entry(marker).or_insert_with(Bytes::new);
        }
        Ok(true)
    }

    fn close(&self) -> Result<()> {
        self.state().stats.closes += 1;
        Ok(())
    }
}
