//! Error types for dpm-db.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dpm-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the artefact-persistence layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// An I/O error occurred while reading or writing an artefact.
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// A CSV artefact failed to read or write.
    #[error("CSV error at {path}: {message}")]
    Csv { path: PathBuf, message: String },

    /// An ARFF artefact was malformed.
    #[error("ARFF artefact {path} is malformed: {reason}")]
    MalformedArff { path: PathBuf, reason: String },

    /// A binary model blob failed to encode or decode.
    #[error("Model blob codec error at {path}: {reason}")]
    BlobCodec { path: PathBuf, reason: String },

    /// The requested artefact does not exist, or exists with zero length
    /// (the "exists and length>0" gate from §7).
    #[error("Artefact {path} does not exist or is empty")]
    NotFound { path: PathBuf },

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a CSV error.
    pub fn csv(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Csv {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-ARFF error.
    pub fn malformed_arff(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedArff {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a model-blob codec error.
    pub fn blob_codec(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::BlobCodec {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}
