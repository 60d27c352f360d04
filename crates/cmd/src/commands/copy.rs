use std::io::Write;

use anyhow::Result;
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};

/// Append the whole of `source` to `target`.
pub fn cp_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    source: &BlobStorePath,
    target: &BlobStorePath,
    out: &mut W,
) -> Result<()> {
    let copied = connector.copy_file(source, target)?;
    writeln!(out, "copied {copied} bytes from {source} to {target}")?;
    Ok(())
}

/// Append `source` to `target`, then delete `source`.
pub fn mv_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    source: &BlobStorePath,
    target: &BlobStorePath,
    out: &mut W,
) -> Result<()> {
    connector.move_file(source, target)?;
    writeln!(out, "moved {source} to {target}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{connector, output, path};

    #[test]
    fn test_cp_and_mv() {
        let connector = connector();
        let a = path("bucket/a");
        let b = path("bucket/b");
        let c = path("bucket/dir/c");
        connector.write_data(&a, &[b"abc"]).unwrap();
        connector.write_data(&a, &[b"def"]).unwrap();

        let mut out = Vec::new();
        cp_command(&connector, &a, &b, &mut out).unwrap();
        mv_command(&connector, &b, &c, &mut out).unwrap();
        assert_eq!(
            output(out),
            "copied 6 bytes from bucket/a to bucket/b\nmoved bucket/b to bucket/dir/c\n"
        );

        assert_eq!(connector.read_data(&a, 0, -1).unwrap(), b"abcdef");
        assert!(!connector.file_exists(&b).unwrap());
        assert_eq!(connector.read_data(&c, 0, -1).unwrap(), b"abcdef");
    }
}
