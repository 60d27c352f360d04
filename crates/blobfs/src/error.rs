// Error types for blob store connector operations

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connector is closed")]
    Closed,

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid argument for '{path}': {message}")]
    InvalidArgument { path: String, message: String },

    #[error("Malformed blob key '{key}': expected '<name>.<number>'")]
    MalformedKey { key: String },

    #[error("Backend error for '{path}': {message}")]
    Backend { path: String, message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),
}

impl Error {
    pub fn invalid_path<P: ToString, R: Into<String>>(path: P, reason: R) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument<P: ToString, M: Into<String>>(path: P, message: M) -> Self {
        Error::InvalidArgument {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed_key<K: Into<String>>(key: K) -> Self {
        Error::MalformedKey { key: key.into() }
    }

    pub fn backend<P: ToString, M: Into<String>>(path: P, message: M) -> Self {
        Error::Backend {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// True for the closed-connector condition.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    #[must_use]
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Error::InvalidPath { .. })
    }
}
