//! Error types for lwi-import
//!
//! Two classes of failure reach callers: shape mismatches while extracting
//! typed fields ([`DeserializeError`]) and resource failures while reading
//! item files. Which of them abort an item is decided by the assembler.

use crate::extract::DeserializeError;
use std::path::PathBuf;
use thiserror::Error;

/// Item import error
#[derive(Debug, Error)]
pub enum ImportError {
    /// Typed field extraction failed
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    /// Primary document has no usable identity
    #[error("no identity in {0}")]
    MissingIdentity(PathBuf),

    /// File could not be read
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sidecar document could not be decoded
    #[error("decoding {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Domain metadata could not be serialized
    #[error("serializing metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Destination store rejected the record
    #[error("store error: {0}")]
    Store(String),

    /// lwi-common error
    #[error("Common error: {0}")]
    Common(#[from] lwi_common::Error),
}

impl ImportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a "file does not exist" read failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
