//! Issue-tracker capability (§6) and the bug catalogue (component 2, §4.2).

use chrono::{DateTime, Utc};
use dpm_utils::{PagedClient, PagedResponse};
use serde_json::Value;
use tracing::warn;

use crate::errors::{DpmError, DpmResult};
use crate::types::BugTicket;

/// One ticket record as reported by the tracker, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawTicket {
    /// Ticket key, e.g. "PROJ-123".
    pub key: Option<String>,
    /// Creation timestamp, RFC 3339.
    pub created: Option<String>,
    /// Resolution timestamp, RFC 3339.
    pub resolved: Option<String>,
    /// Affected-version names, tracker order.
    pub affected_versions: Vec<String>,
}

/// The issue-tracker capability (§6).
pub trait IssueTracker {
    /// All version names known to the project.
    fn fetch_versions(&self, project: &str) -> DpmResult<Vec<String>>;

    /// Raw ticket records for bugs resolved as fixed, in the order returned
    /// by the tracker (not yet sorted to creation-ascending).
    fn fetch_fixed_bugs(&self, project: &str) -> DpmResult<Vec<RawTicket>>;
}

/// A real, REST-backed [`IssueTracker`] implementation.
pub struct RestIssueTracker {
    base_url: String,
    client: PagedClient,
    page_size: usize,
}

impl RestIssueTracker {
    /// Default page size for paged reads.
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    /// Build a tracker client against `base_url` (e.g. a Jira instance root).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: PagedClient::new(),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    fn versions_page(value: &Value) -> PagedResponse {
        let items = value
            .get("values")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = value
            .get("total")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(items.len());
        PagedResponse { items, total }
    }

    fn search_page(value: &Value) -> PagedResponse {
        let items = value
            .get("issues")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = value
            .get("total")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(items.len());
        PagedResponse { items, total }
    }

    fn raw_ticket_from_issue(issue: &Value) -> RawTicket {
        let fields = issue.get("fields");
        RawTicket {
            key: issue
                .get("key")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            created: fields
                .and_then(|f| f.get("created"))
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            resolved: fields
                .and_then(|f| f.get("resolutiondate"))
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            affected_versions: fields
                .and_then(|f| f.get("versions"))
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.get("name").and_then(Value::as_str))
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl IssueTracker for RestIssueTracker {
    fn fetch_versions(&self, project: &str) -> DpmResult<Vec<String>> {
        let url = format!("{}/rest/api/2/project/{}/versions", self.base_url, project);
        let raw = self
            .client
            .get_json(&url, &[])
            .map_err(|e| DpmError::NetworkFailure {
                reason: e.to_string(),
            })?;
        let names = raw
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("name").and_then(Value::as_str))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    fn fetch_fixed_bugs(&self, project: &str) -> DpmResult<Vec<RawTicket>> {
        let jql = format!(
            "project = {project} AND issuetype = Bug AND status in (Resolved, Closed) AND resolution = Fixed"
        );
        let url = format!("{}/rest/api/2/search", self.base_url);
        let fields = "key,created,resolutiondate,versions";
        let issues = self
            .client
            .paginate(
                &url,
                self.page_size,
                &[("jql", jql.as_str()), ("fields", fields)],
                Self::search_page,
            )
            .map_err(|e| DpmError::NetworkFailure {
                reason: e.to_string(),
            })?;
        Ok(issues.iter().map(Self::raw_ticket_from_issue).collect())
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build the bug catalogue (component 2, §4.2): fetch fixed bugs, parse each
/// record, skip malformed ones with a warning, and return the catalogue in
/// creation-timestamp ascending order.
pub fn build_bug_catalogue(tracker: &dyn IssueTracker, project: &str) -> DpmResult<Vec<BugTicket>> {
    let raw_tickets = tracker.fetch_fixed_bugs(project)?;

    let mut tickets: Vec<BugTicket> = Vec::new();
    for raw in raw_tickets {
        let key = match raw.key {
            Some(k) if !k.is_empty() => k,
            _ => {
                warn!("skipping ticket with no key");
                continue;
            }
        };
        let created = match raw.created.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                warn!(key = %key, "skipping ticket with unparsable creation timestamp");
                continue;
            }
        };
        let resolved = match &raw.resolved {
            Some(s) => match parse_timestamp(s) {
                Some(ts) => Some(ts),
                None => {
                    warn!(key = %key, "ticket has unparsable resolution timestamp, treating as unresolved");
                    None
                }
            },
            None => None,
        };

        tickets.push(BugTicket {
            key,
            created,
            resolved,
            affected_versions: raw.affected_versions,
            opening_version: None,
            fixed_version: None,
            introduction_version: None,
            fix_commit: None,
        });
    }

    tickets.sort_by_key(|t| t.created);
    Ok(tickets)
}
