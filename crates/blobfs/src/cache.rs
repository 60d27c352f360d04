//! Metadata cache for blob store connectors
//!
//! Keeps, per full path name, whether a directory exists, whether a file
//! exists, and the file's cumulative size. Entries are filled on a miss and
//! afterwards overwritten by the mutation that changed them; nothing is
//! ever bulk-invalidated.
//!
//! A single lock guards all three maps. It is held only while a map is read
//! or written, never while the backend is queried, so two threads missing
//! on the same name may both compute it. The later insert wins.

use crate::error::Result;
use diagnostics::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Hit/miss counters, for debugging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    directory_exists: HashMap<String, bool>,
    file_exists: HashMap<String, bool>,
    file_size: HashMap<String, u64>,
    stats: CacheStats,
}

type Selector<T> = fn(&mut CacheState) -> &mut HashMap<String, T>;

fn directory_exists_map(state: &mut CacheState) -> &mut HashMap<String, bool> {
    &mut state.directory_exists
}

fn file_exists_map(state: &mut CacheState) -> &mut HashMap<String, bool> {
    &mut state.file_exists
}

fn file_size_map(state: &mut CacheState) -> &mut HashMap<String, u64> {
    &mut state.file_size
}

/// Existence and size cache owned by one connector.
#[derive(Debug)]
pub struct MetadataCache {
    enabled: bool,
    state: Mutex<CacheState>,
}

impl MetadataCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// A cache that never stores anything; every lookup is computed.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.state().stats
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // The maps hold plain values, a panic elsewhere cannot leave them torn
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached<T, F>(&self, select: Selector<T>, name: &str, compute: F) -> Result<T>
    where
        T: Copy,
        F: FnOnce() -> Result<T>,
    {
        if !self.enabled {
            return compute();
        }

        {
            let mut state = self.state();
            if let Some(value) = select(&mut state).get(name).copied() {
                state.stats.hits += 1;
                debug!("Metadata cache hit for {name}", name: name);
                return Ok(value);
            }
            state.stats.misses += 1;
        }

        debug!("Metadata cache miss for {name}", name: name);
        let value = compute()?;

        _ = select(&mut self.state()).insert(name.to_string(), value);
        Ok(value)
    }

    pub fn file_size<F>(&self, name: &str, compute: F) -> Result<u64>
    where
        F: FnOnce() -> Result<u64>,
    {
        self.cached(file_size_map, name, compute)
    }

    pub fn file_exists<F>(&self, name: &str, compute: F) -> Result<bool>
    where
        F: FnOnce() -> Result<bool>,
    {
        self.cached(file_exists_map, name, compute)
    }

    pub fn directory_exists<F>(&self, name: &str, compute: F) -> Result<bool>
    where
        F: FnOnce() -> Result<bool>,
    {
        self.cached(directory_exists_map, name, compute)
    }

    /// `written` bytes were appended to the file as one new blob.
    pub fn file_written(&self, name: &str, written: u64) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        _ = state.file_exists.insert(name.to_string(), true);
        if let Some(size) = state.file_size.get(name).copied() {
            match size.checked_add(written) {
                Some(total) => {
                    _ = state.file_size.insert(name.to_string(), total);
                }
                None => {
                    _ = state.file_size.remove(name);
                }
            }
        }
    }

    /// The file was cut down to exactly `new_length` bytes.
    pub fn file_truncated(&self, name: &str, new_length: u64) {
        if !self.enabled {
            return;
        }
        _ = self.state().file_size.insert(name.to_string(), new_length);
    }

    /// All blobs of the file were removed.
    pub fn file_deleted(&self, name: &str) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        _ = state.file_exists.remove(name);
        _ = state.file_size.remove(name);
    }

    /// `moved` bytes were copied from `source` to `target` and the source
    /// was deleted. `target_was_empty` tells whether the target had no
    /// blobs before, in which case its size is exactly `moved`.
    pub fn file_moved(&self, source: &str, target: &str, moved: u64, target_was_empty: bool) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        _ = state.file_exists.insert(source.to_string(), false);
        _ = state.file_exists.insert(target.to_string(), true);

        _ = state.file_size.remove(source);
        let target_size = if target_was_empty {
            Some(moved)
        } else {
            state
                .file_size
                .get(target)
                .and_then(|size| size.checked_add(moved))
        };
        match target_size {
            Some(size) => {
                _ = state.file_size.insert(target.to_string(), size);
            }
            None => {
                _ = state.file_size.remove(target);
            }
        }
    }

    pub fn directory_created(&self, name: &str) {
        if !self.enabled {
            return;
        }
        _ = self.state().directory_exists.insert(name.to_string(), true);
    }

    /// Cached size without touching the statistics.
    #[must_use]
    pub fn peek_file_size(&self, name: &str) -> Option<u64> {
        self.state().file_size.get(name).copied()
    }

    /// Cached file existence without touching the statistics.
    #[must_use]
    pub fn peek_file_exists(&self, name: &str) -> Option<bool> {
        self.state().file_exists.get(name).copied()
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn test_fill_on_miss_then_hit() {
        let cache = MetadataCache::new(true);
        let calls = Cell::new(0);
        let compute = || -> Result<u64> {
            calls.set(calls.get() + 1);
            Ok(15)
        };

        assert_eq!(cache.file_size("b/f", compute).unwrap(), 15);
        assert_eq!(cache.file_size("b/f", compute).unwrap(), 15);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_disabled_always_computes() {
        let cache = MetadataCache::disabled();
        let calls = Cell::new(0);
        for _ in 0..3 {
            let exists = cache
                .file_exists("b/f", || {
                    calls.set(calls.get() + 1);
                    Ok(true)
                })
                .unwrap();
            assert!(exists);
        }
        assert_eq!(calls.get(), 3);
        assert_eq!(cache.stats(), CacheStats::default());

        cache.file_written("b/f", 10);
        assert_eq!(cache.peek_file_exists("b/f"), None);
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let cache = MetadataCache::new(true);
        let result = cache.file_size("b/f", || Err(Error::backend("b/f", "unreachable")));
        assert!(result.is_err());
        assert_eq!(cache.peek_file_size("b/f"), None);
    }

    #[test]
    fn test_write_adds_only_to_known_size() {
        let cache = MetadataCache::new(true);

        cache.file_written("b/unknown", 5);
        assert_eq!(cache.peek_file_exists("b/unknown"), Some(true));
        assert_eq!(cache.peek_file_size("b/unknown"), None);

        cache.file_size("b/known", || Ok(10)).unwrap();
        cache.file_written("b/known", 5);
        assert_eq!(cache.peek_file_size("b/known"), Some(15));
    }

    #[test]
    fn test_truncate_and_delete() {
        let cache = MetadataCache::new(true);
        cache.file_size("b/f", || Ok(15)).unwrap();
        cache.file_exists("b/f", || Ok(true)).unwrap();

        cache.file_truncated("b/f", 7);
        assert_eq!(cache.peek_file_size("b/f"), Some(7));

        cache.file_deleted("b/f");
        assert_eq!(cache.peek_file_size("b/f"), None);
        assert_eq!(cache.peek_file_exists("b/f"), None);
    }

    #[test]
    fn test_move_transplants_size() {
        let cache = MetadataCache::new(true);
        cache.file_size("b/src", || Ok(15)).unwrap();

        cache.file_moved("b/src", "b/dst", 15, true);
        assert_eq!(cache.peek_file_exists("b/src"), Some(false));
        assert_eq!(cache.peek_file_exists("b/dst"), Some(true));
        assert_eq!(cache.peek_file_size("b/src"), None);
        assert_eq!(cache.peek_file_size("b/dst"), Some(15));
    }

    #[test]
    fn test_move_onto_existing_target() {
        let cache = MetadataCache::new(true);
        cache.file_size("b/src", || Ok(4)).unwrap();
        cache.file_size("b/dst", || Ok(6)).unwrap();

        cache.file_moved("b/src", "b/dst", 4, false);
        assert_eq!(cache.peek_file_size("b/dst"), Some(10));

        // unknown target size stays unknown
        cache.file_size("b/other", || Ok(3)).unwrap();
        cache.file_moved("b/other", "b/fresh", 3, false);
        assert_eq!(cache.peek_file_size("b/fresh"), None);
    }
}
