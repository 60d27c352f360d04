//! Children of a virtual directory, as inferred from a key listing.

use crate::error::Result;
use crate::key;

/// One child discovered below a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildEntry {
    Directory(String),
    File(String),
}

impl ChildEntry {
    pub fn name(&self) -> &str {
        match self {
            ChildEntry::Directory(name) | ChildEntry::File(name) => name,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, ChildEntry::Directory(_))
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, ChildEntry::File(_))
    }
}

/// Distinct directory and file names, each in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    directories: Vec<String>,
    files: Vec<String>,
}

impl Children {
    /// Partition raw child keys into directory and file names, dropping
    /// duplicates (a file with several blobs shows up once per blob).
    pub fn from_keys<I>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut children = Children::default();
        for k in keys {
            if key::is_directory_key(&k) {
                push_unique(&mut children.directories, key::directory_name_of_key(&k));
            } else {
                push_unique(&mut children.files, key::file_name_of_key(&k)?);
            }
        }
        Ok(children)
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    /// Directories first, then files.
    pub fn iter(&self) -> impl Iterator<Item = ChildEntry> + '_ {
        self.directories
            .iter()
            .cloned()
            .map(ChildEntry::Directory)
            .chain(self.files.iter().cloned().map(ChildEntry::File))
    }

    /// All names, directories first. A name used by both a directory and a
    /// file is reported once.
    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        let mut names = self.directories;
        for file in self.files {
            if !names.contains(&file) {
                names.push(file);
            }
        }
        names
    }
}

impl IntoIterator for Children {
    type Item = ChildEntry;
    type IntoIter = std::iter::Chain<
        std::iter::Map<std::vec::IntoIter<String>, fn(String) -> ChildEntry>,
        std::iter::Map<std::vec::IntoIter<String>, fn(String) -> ChildEntry>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        let dirs: fn(String) -> ChildEntry = ChildEntry::Directory;
        let files: fn(String) -> ChildEntry = ChildEntry::File;
        self.directories
            .into_iter()
            .map(dirs)
            .chain(self.files.into_iter().map(files))
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_partition_and_dedup() {
        let children = Children::from_keys(keys(&[
            "dir/b.0",
            "dir/sub/",
            "dir/a.0",
            "dir/b.1",
            "dir/sub/",
            "dir/other/",
        ]))
        .unwrap();

        assert_eq!(children.directories(), ["sub", "other"]);
        assert_eq!(children.files(), ["b", "a"]);
        assert_eq!(children.len(), 4);
    }

    #[test]
    fn test_directories_visited_before_files() {
        let children = Children::from_keys(keys(&["f.0", "d/"])).unwrap();
        let entries: Vec<ChildEntry> = children.into_iter().collect();
        assert_eq!(
            entries,
            vec![
                ChildEntry::Directory("d".to_string()),
                ChildEntry::File("f".to_string())
            ]
        );
    }

    #[test]
    fn test_malformed_file_key() {
        assert!(Children::from_keys(keys(&["dir/noordinal"])).is_err());
    }

    #[test]
    fn test_into_names() {
        let children = Children::from_keys(keys(&["x.0", "x/", "y.0"])).unwrap();
        assert_eq!(children.iter().count(), 3);
        assert_eq!(children.into_names(), vec!["x", "y"]);
    }
}
