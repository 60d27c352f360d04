//! Logical paths into a blob store.
//!
//! A path is an ordered, non-empty sequence of non-empty segments. The first
//! segment names the container (bucket, collection, ...) and the last one the
//! file or directory itself.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Separator between path segments, both in full names and in blob keys.
pub const SEPARATOR: char = '/';

/// Immutable path of a file or directory inside a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobStorePath {
    segments: Vec<String>,
    // segments joined by SEPARATOR, computed once
    full_name: String,
}

impl BlobStorePath {
    /// Build a path from its segments, container first.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let full_name = segments.join(&SEPARATOR.to_string());

        if segments.is_empty() {
            return Err(Error::invalid_argument(
                full_name,
                "a path needs at least one segment",
            ));
        }
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(Error::invalid_argument(
                full_name,
                format!("segment {index} is empty"),
            ));
        }
        if let Some(segment) = segments.iter().find(|s| s.contains(SEPARATOR)) {
            return Err(Error::invalid_argument(
                full_name.clone(),
                format!("segment '{segment}' contains the separator '{SEPARATOR}'"),
            ));
        }

        Ok(Self {
            segments,
            full_name,
        })
    }

    /// Parse a `container/a/b` style string. Leading and trailing separators
    /// are ignored, empty segments in between are rejected.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Err(Error::invalid_argument(
                value,
                "a path needs at least one segment",
            ));
        }
        Self::new(trimmed.split(SEPARATOR))
    }

    /// Path of a direct child of this path.
    pub fn child<S: Into<String>>(&self, name: S) -> Result<Self> {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self::new(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The backend namespace this path lives in.
    pub fn container(&self) -> &str {
        &self.segments[0]
    }

    /// Name of the file or directory itself.
    pub fn identifier(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// All segments joined by [`SEPARATOR`]. Used as the cache key.
    pub fn full_qualified_name(&self) -> &str {
        &self.full_name
    }

    /// The enclosing path, or `None` for a bare container.
    #[must_use]
    pub fn parent(&self) -> Option<BlobStorePath> {
        if self.segments.len() < 2 {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        let full_name = segments.join(&SEPARATOR.to_string());
        Some(Self {
            segments,
            full_name,
        })
    }

    /// True if the path only names a container.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.segments.len() == 1
    }

    /// Segments below the container, i.e. the part encoded into blob keys.
    pub(crate) fn key_segments(&self) -> &[String] {
        &self.segments[1..]
    }
}

impl fmt::Display for BlobStorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

impl FromStr for BlobStorePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for BlobStorePath {
    fn as_ref(&self) -> &str {
        &self.full_name
    }
}
