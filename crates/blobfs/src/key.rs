//! Key conventions mapping paths onto the flat blob namespace.
//!
//! The container is never part of a key. A file `bucket/a/b` is stored as
//! the blobs `a/b.0`, `a/b.1`, ... and the children of directory
//! `bucket/a` are all keys starting with `a/`. Directory keys end with the
//! separator; blob keys always end with digits.

use crate::error::{Error, Result};
use crate::path::{BlobStorePath, SEPARATOR};

/// Separates a file's key from its blob ordinal.
pub const NUMBER_SUFFIX_SEPARATOR: char = '.';

fn joined_key_segments(path: &BlobStorePath) -> String {
    path.key_segments().join(&SEPARATOR.to_string())
}

/// `a/b.` for the file `bucket/a/b`.
#[must_use]
pub fn blob_key_prefix(file: &BlobStorePath) -> String {
    let mut prefix = joined_key_segments(file);
    prefix.push(NUMBER_SUFFIX_SEPARATOR);
    prefix
}

/// `a/b.<ordinal>` for the file `bucket/a/b`.
#[must_use]
pub fn blob_key(file: &BlobStorePath, ordinal: u64) -> String {
    format!("{}{}", blob_key_prefix(file), ordinal)
}

/// `a/` for the directory `bucket/a`. A bare container has the empty prefix.
#[must_use]
pub fn child_prefix(directory: &BlobStorePath) -> String {
    if directory.is_container() {
        return String::new();
    }
    let mut prefix = joined_key_segments(directory);
    prefix.push(SEPARATOR);
    prefix
}

#[must_use]
pub fn is_directory_key(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// True if `key` is `prefix` followed by a non-empty run of ASCII digits,
/// i.e. one of the blobs of the file `prefix` was derived from.
#[must_use]
pub fn matches_blob_prefix(prefix: &str, key: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
}

/// Ordinal encoded in a blob key.
pub fn blob_number(key: &str) -> Result<u64> {
    let (_, suffix) = key
        .rsplit_once(NUMBER_SUFFIX_SEPARATOR)
        .ok_or_else(|| Error::malformed_key(key))?;
    suffix.parse().map_err(|_| Error::malformed_key(key))
}

/// File name of a blob key: `a/b.3` -> `b`.
pub fn file_name_of_key(key: &str) -> Result<&str> {
    let start = key.rfind(SEPARATOR).map_or(0, |i| i + 1);
    let end = key
        .rfind(NUMBER_SUFFIX_SEPARATOR)
        .filter(|&end| end >= start)
        .ok_or_else(|| Error::malformed_key(key))?;
    Ok(&key[start..end])
}

/// Directory name of a directory key: `a/b/` -> `b`.
#[must_use]
pub fn directory_name_of_key(key: &str) -> &str {
    let trimmed = key.strip_suffix(SEPARATOR).unwrap_or(key);
    let start = trimmed.rfind(SEPARATOR).map_or(0, |i| i + 1);
    &trimmed[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> BlobStorePath {
        BlobStorePath::parse(s).unwrap()
    }

    #[test]
    fn test_blob_keys() {
        let file = path("bucket/dir/file");
        assert_eq!(blob_key_prefix(&file), "dir/file.");
        assert_eq!(blob_key(&file, 0), "dir/file.0");
        assert_eq!(blob_key(&file, 42), "dir/file.42");

        let top = path("bucket/file");
        assert_eq!(blob_key(&top, 7), "file.7");
    }

    #[test]
    fn test_child_prefix() {
        assert_eq!(child_prefix(&path("bucket/dir/sub")), "dir/sub/");
        assert_eq!(child_prefix(&path("bucket/dir")), "dir/");
        assert_eq!(child_prefix(&path("bucket")), "");
    }

    #[test]
    fn test_key_classification() {
        assert!(is_directory_key("dir/sub/"));
        assert!(!is_directory_key("dir/file.0"));

        assert!(matches_blob_prefix("dir/file.", "dir/file.12"));
        assert!(!matches_blob_prefix("dir/file.", "dir/file."));
        assert!(!matches_blob_prefix("dir/file.", "dir/file.1x"));
        assert!(!matches_blob_prefix("dir/file.", "dir/file.txt.0"));
        assert!(!matches_blob_prefix("dir/file.", "dir/other.0"));
    }

    #[test]
    fn test_blob_number() {
        assert_eq!(blob_number("dir/file.0").unwrap(), 0);
        assert_eq!(blob_number("dir/file.txt.17").unwrap(), 17);
        assert!(matches!(
            blob_number("dir/file"),
            Err(Error::MalformedKey { .. })
        ));
        assert!(blob_number("dir/file.x").is_err());
    }

    #[test]
    fn test_names_of_keys() {
        assert_eq!(file_name_of_key("dir/file.3").unwrap(), "file");
        assert_eq!(file_name_of_key("file.txt.0").unwrap(), "file.txt");
        assert!(file_name_of_key("dir.x/file").is_err());

        assert_eq!(directory_name_of_key("dir/sub/"), "sub");
        assert_eq!(directory_name_of_key("sub/"), "sub");
    }
}
