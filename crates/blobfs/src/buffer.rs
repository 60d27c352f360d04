//! Destination buffers for ranged reads.
//!
//! A read only asks for its buffer once it knows that at least one byte
//! will be transferred, so a request past the end of a file never
//! allocates.

use crate::error::{Error, Result};
use crate::path::BlobStorePath;

/// Supplies the buffer a read writes into.
pub trait BufferProvider {
    /// A buffer of at least `capacity` bytes. Called at most once per read.
    fn provide(&mut self, file: &BlobStorePath, capacity: u64) -> Result<&mut [u8]>;
}

/// Allocates a fresh zeroed buffer of exactly the requested capacity.
#[derive(Debug, Default)]
pub struct AllocatingProvider {
    buffer: Vec<u8>,
}

impl AllocatingProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The allocated buffer cut down to the `filled` bytes actually read.
    /// Empty if the read never asked for a buffer.
    #[must_use]
    pub fn into_vec(mut self, filled: u64) -> Vec<u8> {
        let filled = usize::try_from(filled).unwrap_or(usize::MAX);
        self.buffer.truncate(filled);
        self.buffer
    }
}

impl BufferProvider for AllocatingProvider {
    fn provide(&mut self, file: &BlobStorePath, capacity: u64) -> Result<&mut [u8]> {
        let capacity = usize::try_from(capacity).map_err(|_| {
            Error::invalid_argument(file, format!("{capacity} bytes exceed the addressable range"))
        })?;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity).map_err(|e| {
            Error::invalid_argument(file, format!("cannot allocate {capacity} bytes: {e}"))
        })?;
        buffer.resize(capacity, 0);
        self.buffer = buffer;
        Ok(self.buffer.as_mut_slice())
    }
}

/// Hands out a caller-owned buffer, which must be large enough for the
/// whole request.
#[derive(Debug)]
pub struct SliceProvider<'a> {
    target: &'a mut [u8],
}

impl<'a> SliceProvider<'a> {
    pub fn new(target: &'a mut [u8]) -> Self {
        Self { target }
    }
}

impl BufferProvider for SliceProvider<'_> {
    fn provide(&mut self, file: &BlobStorePath, capacity: u64) -> Result<&mut [u8]> {
        let remaining = self.target.len();
        if u64::try_from(remaining).is_ok_and(|remaining| remaining < capacity) {
            return Err(Error::invalid_argument(
                file,
                format!(
                    "provided target buffer has not enough space remaining to load the content: {remaining} < {capacity}"
                ),
            ));
        }
        Ok(&mut *self.target)
    }
}
