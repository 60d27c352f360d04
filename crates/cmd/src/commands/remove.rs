use std::io::Write;

use anyhow::{Result, bail};
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath};

/// Delete `file`. A missing file is an error unless `force` is set.
pub fn rm_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    file: &BlobStorePath,
    force: bool,
    out: &mut W,
) -> Result<()> {
    if connector.delete_file(file)? {
        writeln!(out, "removed {file}")?;
    } else if !force {
        bail!("No such file: {file}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{connector, output, path};

    #[test]
    fn test_rm() {
        let connector = connector();
        let file = path("bucket/f");
        connector.write_data(&file, &[b"x"]).unwrap();

        let mut out = Vec::new();
        rm_command(&connector, &file, false, &mut out).unwrap();
        assert_eq!(output(out), "removed bucket/f\n");
        assert!(!connector.file_exists(&file).unwrap());

        let mut out = Vec::new();
        let err = rm_command(&connector, &file, false, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "No such file: bucket/f");
        rm_command(&connector, &file, true, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
