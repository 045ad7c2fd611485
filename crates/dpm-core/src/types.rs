//! Core domain types for the defect-prediction mining pipeline (§3).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dated, named point in project history (§3, §4.1).
///
/// Immutable once built: the release index builds the full set once from the
/// tracker and never mutates it afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Release name, e.g. "2.3.0".
    pub name: String,
    /// Calendar date the release shipped.
    pub date: DateTime<Utc>,
    /// 1-based ordinal in chronological order. Dense and strictly increasing with date.
    pub index: u32,
}

/// A bug ticket as reconciled by the commit-to-ticket linker and labeller (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugTicket {
    /// Ticket key, e.g. "PROJ-123".
    pub key: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Resolution timestamp, set by the linker once a fix commit is found.
    pub resolved: Option<DateTime<Utc>>,
    /// Affected-version names as reported by the tracker, in tracker order.
    pub affected_versions: Vec<String>,
    /// Opening-version index, derived from `created` via the release index.
    pub opening_version: Option<u32>,
    /// Fixed-version index, derived from `resolved` via the release index.
    pub fixed_version: Option<u32>,
    /// Introduction-version index: minimum affected-version index, or the
    /// proportion estimate when affected-versions is empty.
    pub introduction_version: Option<u32>,
    /// The commit hash that resolved this ticket, set by the linker. First
    /// match wins; later commits referencing the same key do not overwrite.
    pub fix_commit: Option<String>,
}

impl BugTicket {
    /// A ticket is eligible for labelling once it has a fix commit and a
    /// derived introduction/fixed-version pair (§4.6).
    pub fn is_labellable(&self) -> bool {
        self.fix_commit.is_some()
            && self.introduction_version.is_some()
            && self.fixed_version.is_some()
    }

    /// The verified `[IV, FV)` window, if both bounds are known.
    pub fn verified_window(&self) -> Option<(u32, u32)> {
        match (self.introduction_version, self.fixed_version) {
            (Some(iv), Some(fv)) => Some((iv, fv)),
            _ => None,
        }
    }
}

/// An opaque commit identifier plus the metadata the VCS capability exposes (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Hex object id.
    pub id: String,
    /// Author display name.
    pub author: String,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// Parent commit ids, in the order git reports them.
    pub parents: Vec<String>,
    /// Full commit message.
    pub message: String,
}

impl Commit {
    /// `true` if this commit has at least one parent (§4.4's precondition).
    pub fn has_parent(&self) -> bool {
        !self.parents.is_empty()
    }

    /// The first parent, if any — the diff base used throughout §4.4/§4.7.
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(|s| s.as_str())
    }
}

/// A stable method identity, carried across releases when `(path, signature)`
/// is unchanged (§3, §9 "carry-through of method identity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId(pub Uuid);

impl MethodId {
    /// Allocate a fresh, random stable id.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The key identifying a method within one release: `(path, signature)`.
///
/// The separator used in any serialised `"<path>::<signature>"` form (`::`)
/// is textually distinct from any character the parser emits in a Java
/// signature, satisfying the invariant in §3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    /// Source file path, relative to the repository root.
    pub path: String,
    /// Canonical signature string, as rendered by the source parser.
    pub signature: String,
}

/// Separator between path and signature in a method's serialised key.
pub const METHOD_KEY_SEPARATOR: &str = "::";

impl MethodKey {
    /// Build a key.
    pub fn new(path: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            signature: signature.into(),
        }
    }

    /// Render as `"<path>::<signature>"`.
    pub fn render(&self) -> String {
        format!("{}{}{}", self.path, METHOD_KEY_SEPARATOR, self.signature)
    }
}

impl std::fmt::Display for MethodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Static, structural metrics for one method (§4.8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMetrics {
    /// Number of declared parameters.
    pub parameter_count: u32,
    /// 1 + count of branching AST nodes reachable under the callable.
    pub cyclomatic_complexity: u32,
    /// Sum of three 0/1 flags (length, parameter count, complexity thresholds).
    pub code_smells: u32,
    /// Constant 0, a placeholder column preserved for schema compatibility.
    pub duplication: u32,
}

/// Change-history metrics accumulated by walking the commit log (§4.7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeHistoryMetrics {
    /// Number of commits whose diff touched this method's line range.
    pub nr: u32,
    /// Number of distinct authors among those commits.
    pub n_auth: u32,
    /// Total inserted lines across touching edits.
    pub stmt_added: u32,
    /// Total deleted lines across touching edits.
    pub stmt_deleted: u32,
    /// Largest single-edit churn (`lengthA + lengthB`) observed.
    pub max_churn: u32,
    /// `(stmt_added + stmt_deleted) / nr`, or 0 when `nr == 0`.
    pub avg_churn: f64,
}

impl ChangeHistoryMetrics {
    /// Recompute `avg_churn` from the accumulated totals, per the invariant
    /// in §8: `avgChurn = (stmtAdded + stmtDeleted) / NR` when `NR > 0`, else 0.
    pub fn recompute_avg_churn(&mut self) {
        self.avg_churn = if self.nr > 0 {
            (self.stmt_added + self.stmt_deleted) as f64 / self.nr as f64
        } else {
            0.0
        };
    }
}

/// A method at one release: identity, metrics, and label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    /// Stable identity, carried across releases.
    pub id: MethodId,
    /// `(path, signature)` key.
    pub key: MethodKey,
    /// Static metrics as of this release's post-image.
    pub static_metrics: StaticMetrics,
    /// Change-history metrics accumulated up to this release.
    pub change_history: ChangeHistoryMetrics,
    /// Whether this method was buggy at this release, per the labeller.
    pub is_buggy: Option<bool>,
    /// Begin line (1-based, inclusive) in the release's post-image.
    pub begin_line: u32,
    /// End line (1-based, inclusive) in the release's post-image.
    pub end_line: u32,
    /// Exact rendered source text of this method, as emitted by the parser.
    pub rendered_source: String,
}

/// One row of the assembled feature matrix (§3, §4.9): `(project, method, release)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Project name.
    pub project: String,
    /// Method name: the method's rendered key.
    pub method_name: String,
    /// Release name this row was measured at.
    pub release: String,
    /// `CodeSmells` column.
    pub code_smells: u32,
    /// `CyclomaticComplexity` column.
    pub cyclomatic_complexity: u32,
    /// `ParameterCount` column.
    pub parameter_count: u32,
    /// `Duplication` column (always 0).
    pub duplication: u32,
    /// `NR` column.
    pub nr: u32,
    /// `NAuth` column.
    pub n_auth: u32,
    /// `stmtAdded` column.
    pub stmt_added: u32,
    /// `stmtDeleted` column.
    pub stmt_deleted: u32,
    /// `maxChurn` column.
    pub max_churn: u32,
    /// `avgChurn` column, rendered with 2 decimal places.
    pub avg_churn: f64,
    /// `IsBuggy` column; never missing.
    pub is_buggy: bool,
}

/// Canonical column order for the CSV artefact (§3, §6).
pub const FEATURE_RECORD_COLUMNS: &[&str] = &[
    "Project",
    "MethodName",
    "Release",
    "CodeSmells",
    "CyclomaticComplexity",
    "ParameterCount",
    "Duplication",
    "NR",
    "NAuth",
    "stmtAdded",
    "stmtDeleted",
    "maxChurn",
    "avgChurn",
    "IsBuggy",
];

/// Numeric feature column names, in the order they appear after the three
/// identifier columns are dropped by the preprocessor (§4.9 step 1).
pub const NUMERIC_FEATURE_COLUMNS: &[&str] = &[
    "CodeSmells",
    "CyclomaticComplexity",
    "ParameterCount",
    "Duplication",
    "NR",
    "NAuth",
    "stmtAdded",
    "stmtDeleted",
    "maxChurn",
    "avgChurn",
];

/// A single scalar ρ estimated by the proportion estimator (§3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionCoefficient(pub f64);

/// Default ρ when unestimable (§3).
pub const DEFAULT_PROPORTION: f64 = 1.5;

impl Default for ProportionCoefficient {
    fn default() -> Self {
        Self(DEFAULT_PROPORTION)
    }
}

/// A named, schema-typed table with one designated class attribute (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names, class attribute last.
    pub columns: Vec<String>,
    /// Row-major numeric matrix (class column encoded as 0.0/1.0).
    pub rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Index of the class column (always last).
    pub fn class_index(&self) -> usize {
        self.columns.len() - 1
    }

    /// Count of rows whose class value is 1.0 ("yes").
    pub fn positive_count(&self) -> usize {
        let ci = self.class_index();
        self.rows.iter().filter(|r| r[ci] >= 0.5).count()
    }

    /// Minority ("yes") ratio.
    pub fn minority_ratio(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.positive_count() as f64 / self.rows.len() as f64
    }
}

/// The last-known `(path, signature) -> id` table carried across releases
/// (§3, §9). Rebuilt after each release completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastKnownMethods {
    table: BTreeMap<MethodKey, MethodId>,
}

impl LastKnownMethods {
    /// Resolve the stable id for `key`, allocating a fresh one if unseen.
    pub fn resolve(&mut self, key: &MethodKey) -> MethodId {
        if let Some(id) = self.table.get(key) {
            return *id;
        }
        let id = MethodId::fresh();
        self.table.insert(key.clone(), id);
        id
    }

    /// Replace the table with exactly the keys seen at the current release,
    /// per "the last-known map is reset to the current release's set after
    /// each release completes" (§4.7).
    pub fn reset_to(&mut self, current: BTreeMap<MethodKey, MethodId>) {
        self.table = current;
    }

    /// Snapshot the current table.
    pub fn snapshot(&self) -> BTreeMap<MethodKey, MethodId> {
        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_key_render_uses_distinct_separator() {
        let key = MethodKey::new("src/Foo.java", "bar(int)");
        assert_eq!(key.render(), "src/Foo.java::bar(int)");
    }

    #[test]
    fn last_known_methods_reuses_id_across_releases() {
        let mut table = LastKnownMethods::default();
        let key = MethodKey::new("src/Foo.java", "bar(int)");
        let id1 = table.resolve(&key);
        let id2 = table.resolve(&key);
        assert_eq!(id1, id2);
    }

    #[test]
    fn avg_churn_is_zero_when_no_revisions() {
        let mut m = ChangeHistoryMetrics::default();
        m.recompute_avg_churn();
        assert_eq!(m.avg_churn, 0.0);
    }

    #[test]
    fn avg_churn_matches_invariant() {
        let mut m = ChangeHistoryMetrics {
            nr: 2,
            stmt_added: 10,
            stmt_deleted: 4,
            ..Default::default()
        };
        m.recompute_avg_churn();
        assert_eq!(m.avg_churn, 7.0);
    }
}
