//! Error types for dpm-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dpm-core operations.
pub type DpmResult<T> = Result<T, DpmError>;

/// Domain-specific errors for the defect-prediction mining pipeline.
#[derive(Error, Debug)]
pub enum DpmError {
    // ------------------------------------------------------------------
    // Structural errors (§7.1): these end a project's pipeline immediately,
    // before any per-component recovery policy applies.
    // ------------------------------------------------------------------
    /// The release index (component 1) was built from an empty release set.
    #[error("No releases found for project `{project}`; nothing to mine.")]
    NoReleases {
        /// The project whose release set was empty.
        project: String,
    },

    /// The version-control capability could not open or clone the local checkout.
    #[error("Failed to open repository at `{path}`: {reason}")]
    RepositoryOpenFailed {
        /// The local checkout path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// `GlobalConfig::validate()` returned a hard error, not merely a warning.
    #[error("Invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The global configuration file could not be parsed.
    #[error("Config at `{path}` is invalid: {reason}")]
    InvalidConfigFile {
        /// Path to the offending config file.
        path: PathBuf,
        /// Parse failure reason.
        reason: String,
    },

    /// A commit with no parent was handed to an operation that requires one
    /// (§4.4). Not a `DiffFailure`: no diff was even attempted.
    #[error("Commit `{commit}` has no parent; skipping")]
    CommitNoParent {
        /// The commit hash.
        commit: String,
    },

    // ------------------------------------------------------------------
    // Error-kind table (§7): component, recovery policy noted on the variant.
    // ------------------------------------------------------------------
    /// Tracker fetch failed (component 2). Fatal for that project.
    #[error("Issue-tracker request failed: {reason}")]
    NetworkFailure {
        /// Description of the failure.
        reason: String,
    },

    /// A ticket record failed to parse (component 2). Recovery: skip record, warn.
    #[error("Malformed ticket `{key}`: {reason}")]
    MalformedTicket {
        /// The ticket key, if known.
        key: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// A source file failed to parse (components 4, 7). Recovery: skip file, warn.
    #[error("Failed to parse `{path}`: {reason}")]
    ParseFailure {
        /// The file that failed to parse.
        path: String,
        /// Parser-reported reason.
        reason: String,
    },

    /// A commit diff failed (components 4, 7). Recovery: skip commit for that file, zero-fill.
    #[error("Diff failed for commit `{commit}` on `{path}`: {reason}")]
    DiffFailure {
        /// The commit hash.
        commit: String,
        /// The file path under diff.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// A release could not be mapped onto a commit. Recovery: warn, omit the release.
    #[error("Release `{release}` has no corresponding commit: {reason}")]
    MissingTag {
        /// The release name.
        release: String,
        /// Why no commit could be found.
        reason: String,
    },

    /// Classifier training had too little data (component 10). Recovery: default tree, no tuning.
    #[error("Insufficient data to train a classifier: {reason}")]
    InsufficientData {
        /// Why training could not proceed normally.
        reason: String,
    },

    /// Threshold calibration failed in the what-if simulator (component 12). Recovery: use 0.5.
    #[error("Threshold calibration failed: {reason}")]
    ThresholdCalibrationFailure {
        /// Underlying reason.
        reason: String,
    },

    /// Synthesizing the refactored dataset failed (component 12). Recovery: abort simulation.
    #[error("Dataset synthesis failed: {reason}")]
    DatasetSynthesisFailure {
        /// Underlying reason.
        reason: String,
    },

    /// Writing a persisted artefact failed. Fatal for that project.
    #[error("Failed to persist artefact `{path}`: {reason}")]
    PersistenceFailure {
        /// The artefact path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    // ------------------------------------------------------------------
    // Wrapped errors
    // ------------------------------------------------------------------
    /// Underlying git2 error.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error surfaced by the storage crate.
    #[error("Storage error: {0}")]
    Db(#[from] dpm_db::DbError),

    /// Error surfaced by the classifier crate.
    #[error("Classifier error: {0}")]
    Model(#[from] dpm_model::ModelError),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DpmError {
    /// Build a [`DpmError::MalformedTicket`].
    pub fn malformed_ticket(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTicket {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`DpmError::ParseFailure`].
    pub fn parse_failure(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`DpmError::DiffFailure`].
    pub fn diff_failure(
        commit: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DiffFailure {
            commit: commit.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`DpmError::PersistenceFailure`].
    pub fn persistence_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
