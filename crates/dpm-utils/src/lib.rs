//! Issue-tracker HTTP client utilities.
//!
//! Isolates the `reqwest` dependency from `dpm-core`, the same way this
//! workspace's utility crate has always kept a heavy/optional dependency out
//! of the core crate.

use thiserror::Error;

pub mod http;

pub use http::{PagedClient, PagedResponse};

/// Errors surfaced by the paged HTTP client.
#[derive(Debug, Error)]
pub enum UtilsError {
    /// The request could not be sent, or the transport failed.
    #[error("request to `{url}` failed: {reason}")]
    RequestFailed {
        /// The URL requested.
        url: String,
        /// Underlying reason.
        reason: String,
    },

    /// The response body was not valid JSON.
    #[error("response from `{url}` was not valid JSON: {reason}")]
    InvalidResponse {
        /// The URL requested.
        url: String,
        /// Underlying reason.
        reason: String,
    },
}
