//! Touched-methods extractor (component 4, §4.4).

use std::collections::HashSet;

use tracing::warn;

use crate::errors::{DpmError, DpmResult};
use crate::source_parser::SourceParser;
use crate::types::{Commit, MethodKey};
use crate::vcs::{ChangeKind, VersionControl};

/// The configured source-file suffix (§6: "only knob; treated as config").
pub const DEFAULT_SOURCE_SUFFIX: &str = ".java";

/// Extract the set of `"<path>::<signature>"` keys touched by `commit`'s
/// diff against its first parent (component 4).
///
/// Requires `commit` to have at least one parent — callers must check
/// [`Commit::has_parent`] first and treat a root commit as "skip with a
/// warning", per §7.1's `CommitNoParent` (not a `DiffFailure`, since no diff
/// is attempted).
pub fn touched_methods(
    vcs: &dyn VersionControl,
    parser: &dyn SourceParser,
    commit: &Commit,
    suffix: &str,
) -> DpmResult<HashSet<String>> {
    let Some(parent) = commit.first_parent() else {
        return Err(DpmError::CommitNoParent {
            commit: commit.id.clone(),
        });
    };

    let entries = match vcs.diff(parent, &commit.id) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(commit = %commit.id, error = %e, "diff failed; commit yields no touched methods");
            return Ok(HashSet::new());
        }
    };

    let mut touched = HashSet::new();

    for entry in entries {
        if entry.kind != ChangeKind::Modified {
            continue;
        }
        let Some(path) = entry.new_path.as_deref() else {
            continue;
        };
        if !path.ends_with(suffix) {
            continue;
        }

        let contents = match vcs.read_file(&commit.id, path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path, error = %e, "failed to read post-image; file yields no touched methods");
                continue;
            }
        };
        let text = match String::from_utf8(contents) {
            Ok(t) => t,
            Err(_) => {
                warn!(path, "post-image is not valid UTF-8; file yields no touched methods");
                continue;
            }
        };

        let callables = match parser.find_callables(&text) {
            Ok(c) => c,
            Err(e) => {
                warn!(path, error = %e, "parse failed; file yields no touched methods");
                continue;
            }
        };

        for hunk in &entry.hunks {
            for callable in &callables {
                if hunk.overlaps(callable.begin_line, callable.end_line) {
                    let key = MethodKey::new(path.to_string(), callable.signature.clone());
                    touched.insert(key.render());
                }
            }
        }
    }

    Ok(touched)
}
