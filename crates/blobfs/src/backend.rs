//! Blob store backend trait.
//!
//! A backend only knows how to list, read, write and delete whole blobs in a
//! flat key namespace. Everything that makes those blobs look like files is
//! done by [`crate::BlobStoreConnector`] on top of these hooks.
//!
//! Keys handed to and returned from a backend follow the conventions in
//! [`crate::key`]: the container is not part of the key, a file's blobs are
//! `<blob_key_prefix><ordinal>` and directory keys end with `/`.

use crate::error::Result;
use crate::path::BlobStorePath;

/// Raw blob operations of one backend connection. Implementations must be
/// safe to call from several threads at once.
pub trait BlobStore: Send + Sync {
    /// Backend-specific handle of one stored blob.
    type Blob: Send + Sync;

    /// Full key of the blob, without container.
    fn blob_key<'b>(&self, blob: &'b Self::Blob) -> &'b str;

    fn blob_size(&self, blob: &Self::Blob) -> u64;

    /// All blobs of `file`, i.e. every key matching
    /// [`crate::key::blob_key_prefix`] followed by an integer. Any order.
    fn blobs(&self, file: &BlobStorePath) -> Result<Vec<Self::Blob>>;

    /// Keys of the direct children of `directory`: blob keys of files in it
    /// and directory keys (trailing `/`) of sub-directories. Any order,
    /// duplicates allowed.
    fn child_keys(&self, directory: &BlobStorePath) -> Result<Vec<String>>;

    /// Delete the given blobs of `file`. Returns true if all were deleted.
    fn delete_blobs(&self, file: &BlobStorePath, blobs: &[Self::Blob]) -> Result<bool>;

    /// Fill `target` with the blob's bytes starting at `offset`.
    fn read_blob(
        &self,
        file: &BlobStorePath,
        blob: &Self::Blob,
        offset: u64,
        target: &mut [u8],
    ) -> Result<()>;

    /// Store one new blob under `key` holding the concatenation of `buffers`.
    fn write_blob(&self, file: &BlobStorePath, key: &str, buffers: &[&[u8]]) -> Result<()>;

    fn file_exists(&self, file: &BlobStorePath) -> Result<bool> {
        Ok(!self.blobs(file)?.is_empty())
    }

    /// Directories are virtual unless the backend keeps markers for them.
    fn directory_exists(&self, _directory: &BlobStorePath) -> Result<bool> {
        Ok(true)
    }

    /// Backends with directory markers create one here. Otherwise a
    /// directory appears with the first blob written below it.
    fn create_directory(&self, _directory: &BlobStorePath) -> Result<bool> {
        Ok(true)
    }

    /// Release connection resources. Called at most once.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}
