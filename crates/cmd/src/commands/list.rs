use std::io::Write;

use anyhow::Result;
use blobfs::{BlobStore, BlobStoreConnector, BlobStorePath, ChildEntry};
use diagnostics::log_debug;

/// List the children of `dir`, directories first. With `long`, files are
/// shown with their size.
pub fn list_command<B: BlobStore, W: Write>(
    connector: &BlobStoreConnector<B>,
    dir: &BlobStorePath,
    long: bool,
    out: &mut W,
) -> Result<()> {
    log_debug!("Listing {dir}", dir: dir.full_qualified_name());

    for entry in connector.visit_children(dir)? {
        match entry {
            ChildEntry::Directory(name) => writeln!(out, "{name}/")?,
            ChildEntry::File(name) if long => {
                let size = connector.file_size(&dir.child(name.as_str())?)?;
                writeln!(out, "{size:>12}  {name}")?;
            }
            ChildEntry::File(name) => writeln!(out, "{name}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{connector, output, path};

    #[test]
    fn test_list_directories_first() {
        let connector = connector();
        connector.write_data(&path("bucket/logs/app"), &[b"12345"]).unwrap();
        connector.write_data(&path("bucket/logs/app"), &[b"678"]).unwrap();
        connector.write_data(&path("bucket/logs/old/x"), &[b"1"]).unwrap();

        let mut out = Vec::new();
        list_command(&connector, &path("bucket/logs"), false, &mut out).unwrap();
        assert_eq!(output(out), "old/\napp\n");

        let mut out = Vec::new();
        list_command(&connector, &path("bucket/logs"), true, &mut out).unwrap();
        assert_eq!(output(out), format!("old/\n{:>12}  app\n", 8));
    }

    #[test]
    fn test_list_empty_directory() {
        let connector = connector();
        let mut out = Vec::new();
        list_command(&connector, &path("bucket/nothing"), true, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
