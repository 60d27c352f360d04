use std::io::Write;

use anyhow::Result;
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};
use diagnostics::log_debug;

/// Copy `length` bytes of `file` from `offset` to `out`; a negative length
/// means to the end of the file.
pub fn cat_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
    offset: u64,
    length: i64,
    out: &mut W,
) -> Result<()> {
    let data = connector.read_data(file, offset, length)?;
    log_debug!("Read {count} bytes from {path}", count: data.len(), path: file.full_qualified_name());
    out.write_all(&data)?;
    out.flush()?;
    Ok(())
}
