//! Blob store backed by the `object_store` crate.
//!
//! Every container maps to its own [`ObjectStore`], either registered up
//! front or created on first use by a factory (one sub-directory per
//! container for [`ObjectStoreBlobStore::local`]). The connector API is
//! synchronous, so calls are driven to completion on a runtime owned by
//! the backend; do not call into it from inside another tokio runtime.

use crate::backend::BlobStore;
use crate::config::ObjectStoreConfig;
use crate::connector::BlobStoreConnector;
use crate::error::{Error, Result};
use crate::key;
use crate::path::{BlobStorePath, SEPARATOR};
use crate::validator::MaxKeyLengthValidator;
use diagnostics::*;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Runtime;

type StoreFactory = Box<dyn Fn(&str) -> Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// Parse a blob key into an object path, rejecting keys the store would
/// have to re-encode.
fn object_path(key: &str) -> Result<ObjectPath> {
    ObjectPath::parse(key).map_err(|e| Error::ObjectStore(e.into()))
}

/// Listing prefix for the children of `directory`, `None` for a container.
fn listing_prefix(directory: &BlobStorePath) -> Result<Option<ObjectPath>> {
    let prefix = key::child_prefix(directory);
    match prefix.strip_suffix(SEPARATOR) {
        Some(prefix) => Ok(Some(object_path(prefix)?)),
        None => Ok(None),
    }
}

pub struct ObjectStoreBlobStore {
    runtime: Runtime,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
    factory: Option<StoreFactory>,
}

impl ObjectStoreBlobStore {
    /// A backend without factory; containers must be registered with
    /// [`ObjectStoreBlobStore::register`].
    pub fn new() -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new()?,
            stores: Mutex::new(HashMap::new()),
            factory: None,
        })
    }

    /// A backend creating the store of each container on first use.
    pub fn with_factory<F>(factory: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Arc<dyn ObjectStore>> + Send + Sync + 'static,
    {
        Ok(Self {
            factory: Some(Box::new(factory)),
            ..Self::new()?
        })
    }

    /// Containers are sub-directories of `root`, created when first used.
    pub fn local<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        Self::with_factory(move |container| {
            if container == "." || container == ".." {
                return Err(Error::invalid_path(container, "not a usable container name"));
            }
            let dir = root.join(container);
            std::fs::create_dir_all(&dir)?;
            let dir_str = dir.display().to_string();
            debug!("Opening local container at {dir}", dir: dir_str);
            let store: Arc<dyn ObjectStore> = Arc::new(LocalFileSystem::new_with_prefix(&dir)?);
            Ok(store)
        })
    }

    /// Every container is a fresh in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::with_factory(|_| {
            let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
            Ok(store)
        })
    }

    /// Serve `container` from `store`, replacing any earlier store.
    pub fn register(&self, container: &str, store: Arc<dyn ObjectStore>) {
        _ = self.stores().insert(container.to_string(), store);
    }

    fn stores(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn ObjectStore>>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, path: &BlobStorePath) -> Result<Arc<dyn ObjectStore>> {
        let container = path.container();
        let mut stores = self.stores();
        if let Some(store) = stores.get(container) {
            return Ok(Arc::clone(store));
        }
        let Some(factory) = &self.factory else {
            return Err(Error::backend(path, "no store registered for container"));
        };
        let store = factory(container)?;
        _ = stores.insert(container.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

impl BlobStore for ObjectStoreBlobStore {
    type Blob = ObjectMeta;

    fn blob_key<'b>(&self, blob: &'b ObjectMeta) -> &'b str {
        blob.location.as_ref()
    }

    fn blob_size(&self, blob: &ObjectMeta) -> u64 {
        blob.size
    }

    fn blobs(&self, file: &BlobStorePath) -> Result<Vec<ObjectMeta>> {
        let store = self.store(file)?;
        let prefix = key::blob_key_prefix(file);
        let parent = match file.parent() {
            Some(parent) => listing_prefix(&parent)?,
            None => None,
        };
        let listing = self
            .runtime
            .block_on(store.list_with_delimiter(parent.as_ref()))?;
        Ok(listing
            .objects
            .into_iter()
            .filter(|meta| key::matches_blob_prefix(&prefix, meta.location.as_ref()))
            .collect())
    }

    fn child_keys(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        let store = self.store(directory)?;
        let prefix = listing_prefix(directory)?;
        let listing = self
            .runtime
            .block_on(store.list_with_delimiter(prefix.as_ref()))?;

        let mut keys: Vec<String> = listing
            .common_prefixes
            .iter()
            .map(|dir| format!("{dir}{SEPARATOR}"))
            .collect();
        keys.extend(
            listing
                .objects
                .into_iter()
                .map(|meta| meta.location.to_string()),
        );
        Ok(keys)
    }

    fn delete_blobs(&self, file: &BlobStorePath, blobs: &[ObjectMeta]) -> Result<bool> {
        let store = self.store(file)?;
        let mut all_deleted = true;
        for blob in blobs {
            match self.runtime.block_on(store.delete(&blob.location)) {
                Ok(()) => {}
                Err(object_store::Error::NotFound { .. }) => all_deleted = false,
                Err(e) => return Err(e.into()),
            }
        }
        debug!("Deleted {count} blobs of {path}",
               count: blobs.len(), path: file.full_qualified_name());
        Ok(all_deleted)
    }

    fn read_blob(
        &self,
        file: &BlobStorePath,
        blob: &ObjectMeta,
        offset: u64,
        target: &mut [u8],
    ) -> Result<()> {
        let store = self.store(file)?;
        let end = offset + target.len() as u64;
        let bytes = self
            .runtime
            .block_on(store.get_range(&blob.location, offset..end))?;
        if bytes.len() != target.len() {
            return Err(Error::backend(
                file,
                format!(
                    "short read from {}: {} of {} bytes",
                    blob.location,
                    bytes.len(),
                    target.len()
                ),
            ));
        }
        target.copy_from_slice(&bytes);
        Ok(())
    }

    fn write_blob(&self, file: &BlobStorePath, key: &str, buffers: &[&[u8]]) -> Result<()> {
        let store = self.store(file)?;
        let location = object_path(key)?;
        let payload = PutPayload::from(buffers.concat());
        _ = self.runtime.block_on(store.put(&location, payload))?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut stores = self.stores();
        debug!("Releasing {count} container stores", count: stores.len());
        stores.clear();
        Ok(())
    }
}

/// Connector over a local directory store as described by `config`.
pub fn open_local(config: &ObjectStoreConfig) -> Result<BlobStoreConnector<ObjectStoreBlobStore>> {
    config.validate()?;
    let root = config.root.display().to_string();
    info!("Opening blob store connector at {root}", root: root);
    let connector =
        BlobStoreConnector::with_config(ObjectStoreBlobStore::local(&config.root)?, &config.connector);
    Ok(match config.max_key_length {
        Some(max) => connector.with_validator(MaxKeyLengthValidator::new(max)),
        None => connector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> BlobStorePath {
        BlobStorePath::parse(s).unwrap()
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = ObjectStoreBlobStore::in_memory().unwrap();
        let file = path("bucket/dir/f");
        store.write_blob(&file, "dir/f.0", &[b"hello ", b"world"]).unwrap();
        store.write_blob(&file, "dir/f.1", &[b"!"]).unwrap();
        store.write_blob(&file, "dir/f.txt.0", &[b"other"]).unwrap();

        let blobs = store.blobs(&file).unwrap();
        let mut keys: Vec<_> = blobs.iter().map(|b| store.blob_key(b).to_string()).collect();
        keys.sort();
        assert_eq!(keys, vec!["dir/f.0", "dir/f.1"]);

        let first = blobs
            .iter()
            .find(|b| store.blob_key(b) == "dir/f.0")
            .unwrap();
        assert_eq!(store.blob_size(first), 11);
        let mut buf = [0u8; 5];
        store.read_blob(&file, first, 6, &mut buf).unwrap();
        assert_eq!(&buf, b"world");

        assert!(store.delete_blobs(&file, &blobs).unwrap());
        assert!(store.blobs(&file).unwrap().is_empty());
        assert_eq!(store.child_keys(&path("bucket/dir")).unwrap(), vec!["dir/f.txt.0"]);
    }

    #[test]
    fn test_child_keys_use_delimiter_listing() {
        let store = ObjectStoreBlobStore::in_memory().unwrap();
        let container = path("bucket");
        store.write_blob(&container, "top.0", &[b"1"]).unwrap();
        store.write_blob(&container, "dir/f.0", &[b"1"]).unwrap();
        store.write_blob(&container, "dir/sub/g.0", &[b"1"]).unwrap();

        let mut top = store.child_keys(&container).unwrap();
        top.sort();
        assert_eq!(top, vec!["dir/", "top.0"]);

        let mut dir = store.child_keys(&path("bucket/dir")).unwrap();
        dir.sort();
        assert_eq!(dir, vec!["dir/f.0", "dir/sub/"]);
    }

    #[test]
    fn test_unregistered_container() {
        let store = ObjectStoreBlobStore::new().unwrap();
        let err = store.blobs(&path("bucket/f")).unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));

        store.register("bucket", Arc::new(InMemory::new()));
        assert!(store.blobs(&path("bucket/f")).unwrap().is_empty());
    }

    #[test]
    fn test_open_local_connector() {
        let dir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig::new(dir.path());
        let connector = open_local(&config).unwrap();
        let file = path("bucket/logs/app");

        assert_eq!(connector.write_data(&file, &[b"0123456789"]).unwrap(), 10);
        assert_eq!(connector.write_data(&file, &[b"abc"]).unwrap(), 3);
        assert!(dir.path().join("bucket/logs/app.0").is_file());
        assert!(dir.path().join("bucket/logs/app.1").is_file());

        assert_eq!(connector.read_data(&file, 8, 4).unwrap(), b"89ab");
        assert_eq!(connector.list_files(&path("bucket/logs")).unwrap(), vec!["app"]);
        assert_eq!(connector.list_directories(&path("bucket")).unwrap(), vec!["logs"]);

        connector.truncate_file(&file, 4).unwrap();
        assert_eq!(connector.read_data(&file, 0, -1).unwrap(), b"0123");
        connector.close().unwrap();
    }

    #[test]
    fn test_open_local_with_key_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ObjectStoreConfig::new(dir.path());
        config.max_key_length = Some(24);
        let connector = open_local(&config).unwrap();

        let err = connector
            .write_data(&path("bucket/much-too-long-a-name"), &[b"x"])
            .unwrap_err();
        assert!(err.is_invalid_path());
        assert!(!dir.path().join("bucket").exists());
    }
}
