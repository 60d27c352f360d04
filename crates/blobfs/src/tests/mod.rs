
use crate::backend::BlobStore;
use crate::error::Result;
use crate::memory::{MemoryBlob, MemoryBlobStore};
use crate::{BlobStoreConnector, BlobStorePath, ConnectorConfig};
use std::sync::atomic::{AtomicBool, Ordering};

/// Content of the file built by [`write_three_blobs`].
pub(crate) const CONTENT: &[u8] = b"0123456789abcde";

pub(crate) fn path(s: &str) -> BlobStorePath {
    BlobStorePath::parse(s).unwrap()
}

pub(crate) fn new_connector() -> BlobStoreConnector<MemoryBlobStore> {
    BlobStoreConnector::new(MemoryBlobStore::new())
}

pub(crate) fn uncached_connector() -> BlobStoreConnector<MemoryBlobStore> {
    BlobStoreConnector::with_config(MemoryBlobStore::new(), &ConnectorConfig { use_cache: false })
}

pub(crate) fn write<B: BlobStore>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
    data: &[u8],
) -> u64 {
    connector.write_data(file, &[data]).unwrap()
}

/// 15 bytes in three 5-byte blobs with ordinals 0, 1 and 2.
pub(crate) fn write_three_blobs<B: BlobStore>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
) {
    for chunk in CONTENT.chunks(5) {
        assert_eq!(write(connector, file, chunk), 5);
    }
}

/// Memory store whose deletes can be made to report failure.
#[derive(Debug, Default)]
pub(crate) struct FailingDeletes {
    pub inner: MemoryBlobStore,
    pub fail: AtomicBool,
}

impl BlobStore for FailingDeletes {
    type Blob = MemoryBlob;

    fn blob_key<'b>(&self, blob: &'b MemoryBlob) -> &'b str {
        self.inner.blob_key(blob)
    }

    fn blob_size(&self, blob: &MemoryBlob) -> u64 {
        self.inner.blob_size(blob)
    }

    fn blobs(&self, file: &BlobStorePath) -> Result<Vec<MemoryBlob>> {
        self.inner.blobs(file)
    }

    fn child_keys(&self, directory: &BlobStorePath) -> Result<Vec<String>> {
        self.inner.child_keys(directory)
    }

    fn delete_blobs(&self, file: &BlobStorePath, blobs: &[MemoryBlob]) -> Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.delete_blobs(file, blobs)
    }

    fn read_blob(
        &self,
        file: &BlobStorePath,
        blob: &MemoryBlob,
        offset: u64,
        target: &mut [u8],
    ) -> Result<()> {
        self.inner.read_blob(file, blob, offset, target)
    }

    fn write_blob(&self, file: &BlobStorePath, key: &str, buffers: &[&[u8]]) -> Result<()> {
        self.inner.write_blob(file, key, buffers)
    }
}
