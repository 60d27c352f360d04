use std::io::Write;

use anyhow::Result;
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};

use crate::common::format_file_size;

/// Print existence and size of `path`, as a file and as a directory.
pub fn stat_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    path: &BlobStorePath,
    out: &mut W,
) -> Result<()> {
    let is_file = connector.file_exists(path)?;
    writeln!(out, "{path}")?;
    writeln!(out, "  file: {is_file}")?;
    if is_file {
        let size = connector.file_size(path)?;
        writeln!(out, "  size: {size} ({})", format_file_size(size))?;
    }
    writeln!(out, "  directory: {}", connector.directory_exists(path)?)?;
    writeln!(out, "  empty: {}", connector.is_empty(path)?)?;
    Ok(())
}
