//! Error types for dpm-model.

use thiserror::Error;

/// Result type alias for dpm-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building, applying, or persisting a classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An options string could not be parsed for the named classifier kind.
    #[error("invalid options `{options}` for classifier `{kind}`: {reason}")]
    InvalidOptions {
        kind: String,
        options: String,
        reason: String,
    },

    /// Training was attempted on a dataset too small or degenerate to fit.
    #[error("cannot train `{kind}`: {reason}")]
    InsufficientData { kind: String, reason: String },

    /// A classifier was asked to predict before it was trained.
    #[error("classifier `{kind}` was not trained before use")]
    NotTrained { kind: String },

    /// Serialized model blob is truncated or was built by a different kind.
    #[error("model blob is corrupt: {reason}")]
    CorruptModel { reason: String },

    /// Binary encode/decode failure.
    #[error("model codec error: {0}")]
    Codec(String),
}

impl ModelError {
    pub fn invalid_options(
        kind: impl Into<String>,
        options: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOptions {
            kind: kind.into(),
            options: options.into(),
            reason: reason.into(),
        }
    }

    pub fn insufficient_data(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn not_trained(kind: impl Into<String>) -> Self {
        Self::NotTrained { kind: kind.into() }
    }

    pub fn corrupt_model(reason: impl Into<String>) -> Self {
        Self::CorruptModel {
            reason: reason.into(),
        }
    }
}
