//! File semantics on top of a flat blob store.
//!
//! A file is the ordered sequence of its blobs, ordered by the numeric
//! suffix of their keys. Appending stores one new blob behind the highest
//! ordinal, truncating deletes trailing blobs and, if the new end falls
//! inside a blob, rewrites that blob's prefix as a fresh trailing blob.
//! Directories are virtual: they exist through the keys below them.
//!
//! Blob order is recomputed from a fresh listing on every call. Only
//! existence and size answers are cached, see [`MetadataCache`].

use crate::backend::BlobStore;
use crate::buffer::{AllocatingProvider, BufferProvider, SliceProvider};
use crate::cache::{CacheStats, MetadataCache};
use crate::children::Children;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::key;
use crate::path::BlobStorePath;
use crate::validator::{NoOpValidator, PathValidator};
use diagnostics::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of appending one blob.
#[derive(Debug, Clone, Copy)]
struct BlobWrite {
    ordinal: u64,
    written: u64,
}

fn to_usize(file: &BlobStorePath, value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        Error::invalid_argument(file, format!("{value} bytes exceed the addressable range"))
    })
}

/// Connector emulating mutable files over one blob store connection.
///
/// All operations take `&self` and may be called from several threads.
/// Appends to the same file from several threads race on ordinal
/// assignment; serializing them is up to the caller or the backend.
pub struct BlobStoreConnector<B: BlobStore> {
    backend: B,
    validator: Box<dyn PathValidator>,
    open: AtomicBool,
    cache: MetadataCache,
}

impl<B: BlobStore> BlobStoreConnector<B> {
    /// Connector with caching enabled and no path validation.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, &ConnectorConfig::default())
    }

    pub fn with_config(backend: B, config: &ConnectorConfig) -> Self {
        Self {
            backend,
            validator: Box::new(NoOpValidator),
            open: AtomicBool::new(true),
            cache: MetadataCache::new(config.use_cache),
        }
    }

    /// Replace the path validator.
    #[must_use]
    pub fn with_validator<V: PathValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn uses_cache(&self) -> bool {
        self.cache.is_enabled()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.is_open() {
            warn!("Operation on closed blob store connector");
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn check(&self, path: &BlobStorePath) -> Result<()> {
        self.ensure_open()?;
        self.validator.validate(path)
    }

    /// Blobs of `file` in ascending ordinal order. Keys that merely share
    /// the prefix (`a.txt.0` listed for file `a`) are dropped.
    fn sorted_blobs(&self, file: &BlobStorePath) -> Result<Vec<B::Blob>> {
        let prefix = key::blob_key_prefix(file);
        let mut numbered = Vec::new();
        for blob in self.backend.blobs(file)? {
            let blob_key = self.backend.blob_key(&blob);
            if !key::matches_blob_prefix(&prefix, blob_key) {
                debug!("Ignoring foreign key {key} listed for {path}",
                       key: blob_key, path: file.full_qualified_name());
                continue;
            }
            numbered.push((key::blob_number(blob_key)?, blob));
        }
        numbered.sort_by_key(|(ordinal, _)| *ordinal);
        Ok(numbered.into_iter().map(|(_, blob)| blob).collect())
    }

    fn total_size(&self, file: &BlobStorePath, blobs: &[B::Blob]) -> Result<u64> {
        blobs.iter().try_fold(0u64, |total, blob| {
            total
                .checked_add(self.backend.blob_size(blob))
                .ok_or_else(|| Error::invalid_argument(file, "file size overflows 64 bits"))
        })
    }

    fn next_blob_number(&self, file: &BlobStorePath) -> Result<u64> {
        let prefix = key::blob_key_prefix(file);
        let mut max = None;
        for blob in self.backend.blobs(file)? {
            let blob_key = self.backend.blob_key(&blob);
            if key::matches_blob_prefix(&prefix, blob_key) {
                let ordinal = key::blob_number(blob_key)?;
                max = max.max(Some(ordinal));
            }
        }
        match max {
            None => Ok(0),
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| Error::invalid_argument(file, "blob ordinals exhausted")),
        }
    }

    fn delete_blobs(&self, file: &BlobStorePath, blobs: &[B::Blob]) -> Result<()> {
        if blobs.is_empty() {
            return Ok(());
        }
        if !self.backend.delete_blobs(file, blobs)? {
            return Err(Error::backend(file, "not all blobs could be deleted"));
        }
        Ok(())
    }

    /// Sum of the sizes of all blobs of `file`, 0 if there are none.
    pub fn file_size(&self, file: &BlobStorePath) -> Result<u64> {
        self.check(file)?;
        self.cache.file_size(file.full_qualified_name(), || {
            let blobs = self.backend.blobs(file)?;
            self.total_size(file, &blobs)
        })
    }

    pub fn directory_exists(&self, directory: &BlobStorePath) -> Result<bool> {
        self.check(directory)?;
        self.cache
            .directory_exists(directory.full_qualified_name(), || {
                self.backend.directory_exists(directory)
            })
    }

    /// True if at least one blob of `file` exists.
    pub fn file_exists(&self, file: &BlobStorePath) -> Result<bool> {
        self.check(file)?;
        self.cache
            .file_exists(file.full_qualified_name(), || self.backend.file_exists(file))
    }

    /// True if no key lives below `directory`. Never cached.
    pub fn is_empty(&self, directory: &BlobStorePath) -> Result<bool> {
        self.check(directory)?;
        Ok(self.backend.child_keys(directory)?.is_empty())
    }

    /// Distinct sub-directory and file names directly below `directory`,
    /// directories first. Never cached.
    pub fn visit_children(&self, directory: &BlobStorePath) -> Result<Children> {
        self.check(directory)?;
        Children::from_keys(self.backend.child_keys(directory)?)
    }

    /// Names of all children, directories first.
    pub fn list_items(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        Ok(self.visit_children(directory)?.into_names())
    }

    pub fn list_directories(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        Ok(self.visit_children(directory)?.directories().to_vec())
    }

    pub fn list_files(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        Ok(self.visit_children(directory)?.files().to_vec())
    }

    pub fn create_directory(&self, directory: &BlobStorePath) -> Result<bool> {
        self.check(directory)?;
        let created = self.backend.create_directory(directory)?;
        if created {
            self.cache.directory_created(directory.full_qualified_name());
        }
        Ok(created)
    }

    /// Files come into existence with their first write; this only checks
    /// the path.
    pub fn create_file(&self, file: &BlobStorePath) -> Result<bool> {
        self.check(file)?;
        Ok(true)
    }

    fn internal_delete_file(&self, file: &BlobStorePath) -> Result<bool> {
        let blobs = self.backend.blobs(file)?;
        if blobs.is_empty() {
            return Ok(false);
        }
        self.delete_blobs(file, &blobs)?;
        Ok(true)
    }

    /// Delete every blob of `file`. Returns false if there was none.
    pub fn delete_file(&self, file: &BlobStorePath) -> Result<bool> {
        self.check(file)?;
        let deleted = self.internal_delete_file(file)?;
        self.cache.file_deleted(file.full_qualified_name());
        debug!("Deleted {path}: {deleted}", path: file.full_qualified_name(), deleted: deleted);
        Ok(deleted)
    }

    fn internal_read_data<P: BufferProvider>(
        &self,
        file: &BlobStorePath,
        provider: &mut P,
        offset: u64,
        length: i64,
    ) -> Result<u64> {
        let blobs = self.sorted_blobs(file)?;
        let total = self.total_size(file, &blobs)?;
        let requested = match u64::try_from(length) {
            Ok(length) if length > 0 => length,
            _ => total.saturating_sub(offset),
        };
        if requested == 0 {
            return Ok(0);
        }

        // skip whole blobs below the offset
        let mut skipped = 0u64;
        let mut first = None;
        for (index, blob) in blobs.iter().enumerate() {
            let size = self.backend.blob_size(blob);
            if skipped + size > offset {
                first = Some(index);
                break;
            }
            skipped += size;
        }
        let Some(first) = first else {
            return Ok(0);
        };

        let target = provider.provide(file, requested)?;
        if to_usize(file, requested)? > target.len() {
            return Err(Error::invalid_argument(
                file,
                format!(
                    "buffer provider returned {} bytes, {requested} are needed",
                    target.len()
                ),
            ));
        }

        let mut remaining = requested;
        let mut read_total = 0u64;
        let mut blob_offset = offset - skipped;
        for blob in &blobs[first..] {
            if remaining == 0 {
                break;
            }
            let amount = (self.backend.blob_size(blob) - blob_offset).min(remaining);
            if amount > 0 {
                let start = to_usize(file, read_total)?;
                let end = start + to_usize(file, amount)?;
                self.backend
                    .read_blob(file, blob, blob_offset, &mut target[start..end])?;
            }
            remaining -= amount;
            read_total += amount;
            blob_offset = 0;
        }

        Ok(read_total)
    }

    /// Read `length` bytes from `offset` through `provider`, which is only
    /// asked for a buffer if at least one byte is going to be read.
    /// A negative `length` reads to the end of the file, zero reads nothing.
    /// Returns the number of bytes read.
    pub fn read_data_with<P: BufferProvider>(
        &self,
        file: &BlobStorePath,
        provider: &mut P,
        offset: u64,
        length: i64,
    ) -> Result<u64> {
        self.check(file)?;
        if length == 0 {
            return Ok(0);
        }
        self.internal_read_data(file, provider, offset, length)
    }

    /// Read into a newly allocated buffer. A `length` beyond the end of
    /// the file is capped.
    pub fn read_data(&self, file: &BlobStorePath, offset: u64, length: i64) -> Result<Vec<u8>> {
        let mut provider = AllocatingProvider::new();
        let read = self.read_data_with(file, &mut provider, offset, length)?;
        Ok(provider.into_vec(read))
    }

    /// Read from `offset` to the end of the file into `target`, which must
    /// hold all of it.
    pub fn read_data_into(
        &self,
        file: &BlobStorePath,
        target: &mut [u8],
        offset: u64,
    ) -> Result<u64> {
        self.read_data_range_into(file, target, offset, -1)
    }

    /// Read `length` bytes from `offset` into `target`, which must have room
    /// for `length` bytes.
    pub fn read_data_range_into(
        &self,
        file: &BlobStorePath,
        target: &mut [u8],
        offset: u64,
        length: i64,
    ) -> Result<u64> {
        self.read_data_with(file, &mut SliceProvider::new(target), offset, length)
    }

    fn internal_write_data(
        &self,
        file: &BlobStorePath,
        buffers: &[&[u8]],
    ) -> Result<BlobWrite> {
        let written = buffers.iter().try_fold(0u64, |total, buffer| {
            u64::try_from(buffer.len())
                .ok()
                .and_then(|len| total.checked_add(len))
                .ok_or_else(|| Error::invalid_argument(file, "write size overflows 64 bits"))
        })?;

        let ordinal = self.next_blob_number(file)?;
        let blob_key = key::blob_key(file, ordinal);
        self.backend.write_blob(file, &blob_key, buffers)?;
        debug!("Wrote {written} bytes to {key}", written: written, key: blob_key.as_str());
        Ok(BlobWrite { ordinal, written })
    }

    /// Append the concatenation of `buffers` to `file` as one new blob.
    /// Returns the number of bytes written. Writing nothing still adds an
    /// empty blob, which makes a zero-length file exist.
    pub fn write_data(&self, file: &BlobStorePath, buffers: &[&[u8]]) -> Result<u64> {
        self.check(file)?;
        let write = self.internal_write_data(file, buffers)?;
        self.cache
            .file_written(file.full_qualified_name(), write.written);
        Ok(write.written)
    }

    fn internal_copy_file(
        &self,
        source: &BlobStorePath,
        target: &BlobStorePath,
        offset: u64,
        length: i64,
    ) -> Result<BlobWrite> {
        let mut provider = AllocatingProvider::new();
        let read = if length == 0 {
            0
        } else {
            self.internal_read_data(source, &mut provider, offset, length)?
        };
        let data = provider.into_vec(read);
        self.internal_write_data(target, &[&data])
    }

    /// Append all of `source` to `target` as a single new blob.
    pub fn copy_file(&self, source: &BlobStorePath, target: &BlobStorePath) -> Result<u64> {
        self.copy_file_range(source, target, 0, -1)
    }

    /// Append the given range of `source` to `target` as a single new blob,
    /// however `source` is split into blobs. Returns the bytes copied.
    pub fn copy_file_range(
        &self,
        source: &BlobStorePath,
        target: &BlobStorePath,
        offset: u64,
        length: i64,
    ) -> Result<u64> {
        self.check(source)?;
        self.validator.validate(target)?;

        let copied = self.internal_copy_file(source, target, offset, length)?.written;
        self.cache.file_written(target.full_qualified_name(), copied);
        debug!("Copied {copied} bytes from {source} to {target}",
               copied: copied,
               source: source.full_qualified_name(),
               target: target.full_qualified_name());
        Ok(copied)
    }

    /// Copy `source` to the end of `target`, then delete `source`.
    ///
    /// Not atomic: if the delete fails, both files hold the content and
    /// the error is returned.
    pub fn move_file(&self, source: &BlobStorePath, target: &BlobStorePath) -> Result<()> {
        self.check(source)?;
        self.validator.validate(target)?;
        if source == target {
            return Ok(());
        }

        let write = self.internal_copy_file(source, target, 0, -1)?;
        let deleted = self
            .backend
            .blobs(source)
            .and_then(|blobs| self.delete_blobs(source, &blobs));
        if let Err(err) = deleted {
            self.cache
                .file_written(target.full_qualified_name(), write.written);
            let error_str = err.to_string();
            warn!("Move left {source} in place: {error}",
                  source: source.full_qualified_name(), error: error_str);
            return Err(err);
        }

        self.cache.file_moved(
            source.full_qualified_name(),
            target.full_qualified_name(),
            write.written,
            write.ordinal == 0,
        );
        debug!("Moved {moved} bytes from {source} to {target}",
               moved: write.written,
               source: source.full_qualified_name(),
               target: target.full_qualified_name());
        Ok(())
    }

    fn internal_truncate_file(&self, file: &BlobStorePath, new_length: u64) -> Result<()> {
        let blobs = self.sorted_blobs(file)?;

        let mut start = 0u64;
        let mut boundary = None;
        for (index, blob) in blobs.iter().enumerate() {
            let end = start + self.backend.blob_size(blob);
            if start <= new_length && new_length <= end {
                boundary = Some((index, start, end));
                break;
            }
            start = end;
        }
        let Some((index, blob_start, blob_end)) = boundary else {
            return Err(Error::invalid_argument(
                file,
                format!("new length {new_length} exceeds file length {start}"),
            ));
        };

        if new_length == blob_start {
            self.delete_blobs(file, &blobs[index..])
        } else if new_length == blob_end {
            self.delete_blobs(file, &blobs[index + 1..])
        } else {
            let mut prefix = vec![0u8; to_usize(file, new_length - blob_start)?];
            self.backend.read_blob(file, &blobs[index], 0, &mut prefix)?;
            self.delete_blobs(file, &blobs[index..])?;
            _ = self.internal_write_data(file, &[&prefix])?;
            Ok(())
        }
    }

    /// Cut `file` down to `new_length` bytes. Zero deletes the file; a
    /// length beyond the current size is rejected.
    pub fn truncate_file(&self, file: &BlobStorePath, new_length: u64) -> Result<()> {
        if new_length == 0 {
            _ = self.delete_file(file)?;
            return Ok(());
        }

        self.check(file)?;
        self.internal_truncate_file(file, new_length)?;
        self.cache
            .file_truncated(file.full_qualified_name(), new_length);
        debug!("Truncated {path} to {length} bytes",
               path: file.full_qualified_name(), length: new_length);
        Ok(())
    }

    /// Close the connector and release the backend. Later calls do nothing.
    pub fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("Closing blob store connector");
            self.backend.close()?;
        }
        Ok(())
    }
}
