use std::io::{Read, Write};

use anyhow::Result;
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};
use diagnostics::log_info;

/// Append everything readable from `input` to `file` as one new blob.
pub fn append_command<B: BlobStore, R: Read, W: Write>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let mut data = Vec::new();
    _ = input.read_to_end(&mut data)?;

    let written = connector.write_data(file, &[&data])?;
    log_info!("Appended {written} bytes to {path}", written: written, path: file.full_qualified_name());
    writeln!(out, "appended {written} bytes to {file}")?;
    Ok(())
}
