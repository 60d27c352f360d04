use std::io::Write;

use anyhow::{Context, Result};
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};

pub fn truncate_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
    length: u64,
    out: &mut W,
) -> Result<()> {
    connector
        .truncate_file(file, length)
        .with_context(|| format!("Failed to truncate {file} to {length} bytes"))?;
    writeln!(out, "truncated {file} to {length} bytes")?;
    Ok(())
}
