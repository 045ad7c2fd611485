//! A short-lived, paged JSON REST client.
//!
//! Per §5: "The HTTP client for the tracker is created per request and
//! closed on exit" — each call builds its own `reqwest::blocking::Client`
//! rather than holding one open for the life of the pipeline. Calls carry a
//! bounded timeout and are retried zero times (§5); a failed call bubbles as
//! a single error.

use std::time::Duration;

use serde_json::Value;

use crate::UtilsError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One decoded page of a paged REST response.
pub struct PagedResponse {
    /// The items returned on this page.
    pub items: Vec<Value>,
    /// The reported total item count across all pages.
    pub total: usize,
}

/// A short-lived JSON client for the issue-tracker capability.
#[derive(Debug, Clone, Copy)]
pub struct PagedClient {
    timeout: Duration,
}

impl Default for PagedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PagedClient {
    /// A client with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A client with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch `url` with `query` as query-string parameters and parse the
    /// body as JSON. Builds a fresh transport for this one call.
    pub fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, UtilsError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| UtilsError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| UtilsError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| UtilsError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        response.json().map_err(|e| UtilsError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch every page of a paged endpoint, requesting pages until the
    /// observed item count reaches the reported total or an empty page is
    /// returned (§4.2's pagination rule, generalised to both tracker reads).
    ///
    /// `page_of` decodes one raw JSON page into its items and reported total.
    pub fn paginate(
        &self,
        url: &str,
        page_size: usize,
        extra_query: &[(&str, &str)],
        page_of: impl Fn(&Value) -> PagedResponse,
    ) -> Result<Vec<Value>, UtilsError> {
        let mut collected = Vec::new();
        let mut start_at = 0usize;

        loop {
            let start_at_str = start_at.to_string();
            let page_size_str = page_size.to_string();
            let mut query: Vec<(&str, &str)> = vec![
                ("startAt", start_at_str.as_str()),
                ("maxResults", page_size_str.as_str()),
            ];
            query.extend_from_slice(extra_query);

            let raw = self.get_json(url, &query)?;
            let page = page_of(&raw);

            if page.items.is_empty() {
                break;
            }

            let returned = page.items.len();
            collected.extend(page.items);
            start_at += returned;

            if collected.len() >= page.total {
                break;
            }
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_bounded() {
        let client = PagedClient::new();
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn with_timeout_overrides_default() {
        let client = PagedClient::with_timeout(Duration::from_secs(5));
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
