//! BlobFS - mutable, randomly addressable files on top of flat blob stores
//!
//! Every file is a sequence of immutable blobs keyed `<dir>/<name>.<n>`.
//! Appends add a blob, truncation drops or rewrites trailing blobs and
//! reads stitch ranges together across blob boundaries.
//!
//! Set BLOBFS_LOG to control logging:
//! - BLOBFS_LOG=off (default) - silent
//! - BLOBFS_LOG=info - connector lifecycle
//! - BLOBFS_LOG=debug - cache hits and misses, every mutation

/// Path model
pub mod path;

/// Key encoding
pub mod key;

/// Directory listings
pub mod children;

/// Existence and size cache
pub mod cache;

/// Raw blob operations a backend provides
pub mod backend;

/// Path checks run before every operation
pub mod validator;

/// Read buffer providers
pub mod buffer;

/// YAML configuration
pub mod config;

/// Error types
pub mod error;

/// File emulation on top of a [`BlobStore`]
pub mod connector;

/// In-memory backend
pub mod memory;

/// Backend over the `object_store` crate
pub mod objstore;

pub use backend::BlobStore;
pub use buffer::{AllocatingProvider, BufferProvider, SliceProvider};
pub use cache::{CacheStats, MetadataCache};
pub use children::{ChildEntry, Children};
pub use config::{ConnectorConfig, ObjectStoreConfig};
pub use connector::BlobStoreConnector;
pub use error::{Error, Result};
pub use memory::{MemoryBlob, MemoryBlobStore, MemoryStoreStats};
pub use objstore::{ObjectStoreBlobStore, open_local};
pub use path::BlobStorePath;
pub use validator::{MaxKeyLengthValidator, NoOpValidator, PathValidator};

#[cfg(test)]
mod tests;
