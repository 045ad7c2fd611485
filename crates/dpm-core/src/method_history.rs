//! Method-history extractor (component 7, §4.7) — the hardest component.
//!
//! Per release commit: list non-test source files, parse each one's
//! post-image, assign stable method identity, compute static metrics, and
//! walk each file's commit log to accumulate change-history metrics.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::errors::DpmResult;
use crate::source_parser::SourceParser;
use crate::types::{ChangeHistoryMetrics, LastKnownMethods, Method, MethodKey};
use crate::vcs::VersionControl;

/// Extract every method at `release_commit`, with static and change-history
/// metrics, updating `last_known` with the identities seen at this release.
///
/// `last_known` is reset to exactly this release's key set once extraction
/// completes (§4.7: "the last-known map is reset to the current release's
/// set after each release completes").
pub fn extract_release_methods(
    vcs: &dyn VersionControl,
    parser: &dyn SourceParser,
    release_commit: &str,
    suffix: &str,
    last_known: &mut LastKnownMethods,
) -> DpmResult<Vec<Method>> {
    let files = vcs.list_files(release_commit, suffix)?;
    let mut methods = Vec::new();
    let mut current_keys: BTreeMap<MethodKey, crate::types::MethodId> = BTreeMap::new();

    for path in files {
        let contents = match vcs.read_file(release_commit, &path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path, error = %e, "failed to read file at release commit; skipping");
                continue;
            }
        };
        let text = match String::from_utf8(contents) {
            Ok(t) => t,
            Err(_) => {
                warn!(path, "file is not valid UTF-8; skipping");
                continue;
            }
        };
        let callables = match parser.find_callables(&text) {
            Ok(c) => c,
            Err(e) => {
                warn!(path, error = %e, "parse failed; file contributes zero methods");
                continue;
            }
        };

        for callable in callables {
            let key = MethodKey::new(path.clone(), callable.signature.clone());
            let id = last_known.resolve(&key);
            current_keys.insert(key.clone(), id);

            let static_metrics = parser.static_metrics(&callable);
            let change_history = compute_change_history(
                vcs,
                release_commit,
                &path,
                callable.begin_line,
                callable.end_line,
            );

            methods.push(Method {
                id,
                key,
                static_metrics,
                change_history,
                is_buggy: None,
                begin_line: callable.begin_line,
                end_line: callable.end_line,
                rendered_source: callable.source,
            });
        }
    }

    last_known.reset_to(current_keys);
    Ok(methods)
}

/// Walk the commit log restricted to `path`, reachable from
/// `release_commit`, accumulating change-history metrics for the method
/// whose post-image range at the release is `[begin_line, end_line]`.
///
/// Any commit-log or diff failure yields the zero-valued block, per §4.7's
/// explicit tolerance for this case.
fn compute_change_history(
    vcs: &dyn VersionControl,
    release_commit: &str,
    path: &str,
    begin_line: u32,
    end_line: u32,
) -> ChangeHistoryMetrics {
    let mut metrics = ChangeHistoryMetrics::default();

    let history = match vcs.commit_log(release_commit, Some(path)) {
        Ok(h) => h,
        Err(_) => return metrics,
    };

    let mut authors: BTreeSet<String> = BTreeSet::new();

    for commit in &history {
        let Some(parent) = commit.first_parent() else {
            continue;
        };
        let entries = match vcs.diff(parent, &commit.id) {
            Ok(e) => e,
            Err(_) => continue,
        };

        let mut touched_this_commit = false;
        for entry in entries {
            if entry.new_path.as_deref() != Some(path) {
                continue;
            }
            for hunk in &entry.hunks {
                if hunk.overlaps(begin_line, end_line) {
                    metrics.stmt_added += hunk.length_b();
                    metrics.stmt_deleted += hunk.length_a();
                    metrics.max_churn = metrics.max_churn.max(hunk.length_a() + hunk.length_b());
                    touched_this_commit = true;
                }
            }
        }

        if touched_this_commit {
            metrics.nr += 1;
            authors.insert(commit.author.clone());
        }
    }

    metrics.n_auth = authors.len() as u32;
    metrics.recompute_avg_churn();
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_parser::JavaSourceParser;
    use crate::types::Commit;
    use crate::vcs::{ChangeKind, DiffEntry, HunkEdit};
    use chrono::Utc;
    use std::collections::HashMap;

    struct FakeVcs {
        files: Vec<String>,
        contents: HashMap<String, String>,
        history: Vec<Commit>,
        diffs: HashMap<String, Vec<DiffEntry>>,
    }

    impl VersionControl for FakeVcs {
        fn list_tags(&self) -> DpmResult<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }
        fn list_files(&self, _commit: &str, _suffix: &str) -> DpmResult<Vec<String>> {
            Ok(self.files.clone())
        }
        fn read_file(&self, _commit: &str, path: &str) -> DpmResult<Vec<u8>> {
            Ok(self
                .contents
                .get(path)
                .cloned()
                .unwrap_or_default()
                .into_bytes())
        }
        fn commit_log(&self, _head: &str, _path: Option<&str>) -> DpmResult<Vec<Commit>> {
            Ok(self.history.clone())
        }
        fn diff(&self, _a: &str, b: &str) -> DpmResult<Vec<DiffEntry>> {
            Ok(self.diffs.get(b).cloned().unwrap_or_default())
        }
        fn find_commit(&self, _id: &str) -> DpmResult<Commit> {
            unimplemented!()
        }
        fn all_reachable_commits(&self) -> DpmResult<Vec<Commit>> {
            Ok(self.history.clone())
        }
    }

    #[test]
    fn identity_carries_forward_across_releases() {
        let file = "public class Foo {\n    public void bar() {\n        int x = 1;\n    }\n}\n";
        let mut contents = HashMap::new();
        contents.insert("Foo.java".to_string(), file.to_string());

        let vcs = FakeVcs {
            files: vec!["Foo.java".to_string()],
            contents,
            history: vec![],
            diffs: HashMap::new(),
        };
        let parser = JavaSourceParser::new();
        let mut last_known = LastKnownMethods::default();

        let r1 = extract_release_methods(&vcs, &parser, "c1", ".java", &mut last_known).unwrap();
        let r2 = extract_release_methods(&vcs, &parser, "c2", ".java", &mut last_known).unwrap();

        assert_eq!(r1.len(), 1);
        assert_eq!(r2.len(), 1);
        assert_eq!(r1[0].id, r2[0].id);
    }

    #[test]
    fn overlapping_historical_edit_accumulates_churn() {
        let file = "public class Foo {\n    public void bar() {\n        int x = 1;\n    }\n}\n";
        let mut contents = HashMap::new();
        contents.insert("Foo.java".to_string(), file.to_string());

        let history_commit = Commit {
            id: "h2".to_string(),
            author: "alice".to_string(),
            timestamp: Utc::now(),
            parents: vec!["h1".to_string()],
            message: String::new(),
        };
        let mut diffs = HashMap::new();
        diffs.insert(
            "h2".to_string(),
            vec![DiffEntry {
                old_path: Some("Foo.java".to_string()),
                new_path: Some("Foo.java".to_string()),
                kind: ChangeKind::Modified,
                hunks: vec![HunkEdit {
                    old_start: 1,
                    old_lines: 1,
                    new_start: 2,
                    new_lines: 1,
                }],
            }],
        );

        let vcs = FakeVcs {
            files: vec!["Foo.java".to_string()],
            contents,
            history: vec![history_commit],
            diffs,
        };
        let parser = JavaSourceParser::new();
        let mut last_known = LastKnownMethods::default();

        let methods = extract_release_methods(&vcs, &parser, "c1", ".java", &mut last_known).unwrap();
        let bar = methods.iter().find(|m| m.key.signature.starts_with("bar")).unwrap();
        assert_eq!(bar.change_history.nr, 1);
        assert_eq!(bar.change_history.n_auth, 1);
        assert!(bar.change_history.avg_churn > 0.0);
    }

    #[test]
    fn unparsable_file_contributes_zero_methods_without_aborting() {
        let vcs = FakeVcs {
            files: vec!["Foo.java".to_string()],
            contents: HashMap::new(),
            history: vec![],
            diffs: HashMap::new(),
        };
        let parser = JavaSourceParser::new();
        let mut last_known = LastKnownMethods::default();
        let methods = extract_release_methods(&vcs, &parser, "c1", ".java", &mut last_known).unwrap();
        assert!(methods.is_empty());
    }
}
