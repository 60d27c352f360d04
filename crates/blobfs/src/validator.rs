//! Pluggable path validation, run before every connector operation.

use crate::error::{Error, Result};
use crate::key;
use crate::path::BlobStorePath;

pub trait PathValidator: Send + Sync {
    fn validate(&self, path: &BlobStorePath) -> Result<()>;
}

/// Accepts every path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpValidator;

impl PathValidator for NoOpValidator {
    fn validate(&self, _path: &BlobStorePath) -> Result<()> {
        Ok(())
    }
}

impl<F> PathValidator for F
where
    F: Fn(&BlobStorePath) -> Result<()> + Send + Sync,
{
    fn validate(&self, path: &BlobStorePath) -> Result<()> {
        self(path)
    }
}

/// Rejects paths whose longest possible blob key would exceed a backend
/// limit (S3 and GCS allow 1024 bytes, for instance).
#[derive(Debug, Clone, Copy)]
pub struct MaxKeyLengthValidator {
    max_key_length: usize,
}

impl MaxKeyLengthValidator {
    // room for the largest ordinal a u64 can hold
    const ORDINAL_DIGITS: usize = 20;

    #[must_use]
    pub fn new(max_key_length: usize) -> Self {
        Self { max_key_length }
    }
}

impl PathValidator for MaxKeyLengthValidator {
    fn validate(&self, path: &BlobStorePath) -> Result<()> {
        let length = key::blob_key_prefix(path).len() + Self::ORDINAL_DIGITS;
        if length > self.max_key_length {
            return Err(Error::invalid_path(
                path,
                format!(
                    "blob keys may be up to {length} bytes long, the backend allows {}",
                    self.max_key_length
                ),
            ));
        }
        Ok(())
    }
}
