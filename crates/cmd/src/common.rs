use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use blobfs::{BlobStoreConnector, BlobStorePath, ObjectStoreBlobStore, ObjectStoreConfig};

/// Environment variable naming the store root when `--root` is not given.
pub const ROOT_ENV_VAR: &str = "BLOBFS_ROOT";

/// Get the store root with an optional override, falling back to BLOBFS_ROOT
pub fn get_root_with_override(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }

    env::var(ROOT_ENV_VAR)
        .map(PathBuf::from)
        .map_err(|_| anyhow!("{ROOT_ENV_VAR} environment variable not set and no --root given"))
}

/// Resolve the store configuration: a YAML file wins over a bare root.
pub fn resolve_config(
    config_path: Option<&Path>,
    root_override: Option<PathBuf>,
) -> Result<ObjectStoreConfig> {
    match config_path {
        Some(path) => ObjectStoreConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(ObjectStoreConfig::new(get_root_with_override(root_override)?)),
    }
}

pub fn open_connector(config: &ObjectStoreConfig) -> Result<BlobStoreConnector<ObjectStoreBlobStore>> {
    blobfs::open_local(config)
        .with_context(|| format!("Failed to open blob store at {}", config.root.display()))
}

/// Parse a `container/dir/name` argument.
pub fn parse_path(value: &str) -> Result<BlobStorePath> {
    BlobStorePath::parse(value).with_context(|| format!("Invalid path '{value}'"))
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_root_override_wins() {
        let root = get_root_with_override(Some(PathBuf::from("/tmp/blobs"))).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/blobs"));
    }

    #[test]
    fn test_resolve_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.yaml");
        std::fs::write(&file, "root: /srv/blobs\nconnector:\n  use_cache: false\n").unwrap();

        let config = resolve_config(Some(file.as_path()), Some(PathBuf::from("/ignored"))).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/blobs"));
        assert!(!config.connector.use_cache);

        let err = resolve_config(Some(dir.path().join("missing.yaml").as_path()), None).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_open_connector_on_host_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(None, Some(dir.path().to_path_buf())).unwrap();
        let connector = open_connector(&config).unwrap();

        let mut out = Vec::new();
        let file = parse_path("bucket/notes/today").unwrap();
        crate::commands::append_command(&connector, &file, &mut &b"remember"[..], &mut out)
            .unwrap();
        assert!(dir.path().join("bucket/notes/today.0").is_file());

        let mut out = Vec::new();
        crate::commands::cat_command(&connector, &file, 3, 5, &mut out).unwrap();
        assert_eq!(out, b"ember");
        connector.close().unwrap();
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/bucket/a/b/").unwrap().to_string(), "bucket/a/b");
        assert!(parse_path("").is_err());
    }
}
