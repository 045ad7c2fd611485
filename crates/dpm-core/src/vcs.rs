//! Version-control capability (§6): the low-level VCS driver.
//!
//! This module defines the low-level capability set as the
//! [`VersionControl`] trait and ships one concrete, real implementation,
//! [`GitVersionControl`], backed by `git2` (libgit2 bindings) for real git
//! plumbing rather than an internal revision log.
//!
//! Acquisition is scoped: opening a repository returns an RAII guard
//! (`GitVersionControl` itself) that releases the underlying handle when
//! dropped, satisfying §5's "owned exclusively by the pipeline of its
//! project; it must be released on any exit path".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DpmError, DpmResult};
use crate::types::Commit;

/// The kind of change a [`DiffEntry`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// File added.
    Added,
    /// File modified in place.
    Modified,
    /// File deleted.
    Deleted,
    /// File renamed (rename detection is on, per §6).
    Renamed,
    /// Any other change kind (copy, type-change, ...).
    Other,
}

/// One edit within a diff hunk, in the *new* (post-image) file's line numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkEdit {
    /// 0-based start line of this hunk in the old (pre-image) file.
    pub old_start: u32,
    /// Number of lines this hunk spans in the old file.
    pub old_lines: u32,
    /// 0-based start line of this hunk in the new (post-image) file.
    pub new_start: u32,
    /// Number of lines this hunk spans in the new file.
    pub new_lines: u32,
}

impl HunkEdit {
    /// `editBeginB + 1` in §4.4/§4.7's notation: the 1-based inclusive start
    /// of this edit's interval in the post-image.
    pub fn edit_begin_b(&self) -> u32 {
        self.new_start + 1
    }

    /// `editEndB` in §4.4/§4.7's notation: the 1-based inclusive end of this
    /// edit's interval in the post-image.
    pub fn edit_end_b(&self) -> u32 {
        self.new_start + self.new_lines.max(1)
    }

    /// `true` if `[editBeginB+1, editEndB]` overlaps `[begin, end]`.
    pub fn overlaps(&self, begin: u32, end: u32) -> bool {
        self.edit_begin_b() <= end && begin <= self.edit_end_b()
    }

    /// `lengthA` — the number of lines this edit removed from the old file.
    pub fn length_a(&self) -> u32 {
        self.old_lines
    }

    /// `lengthB` — the number of lines this edit introduced in the new file.
    pub fn length_b(&self) -> u32 {
        self.new_lines
    }
}

/// One changed file within a commit-to-commit diff (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Path in the pre-image, if the file existed there.
    pub old_path: Option<String>,
    /// Path in the post-image, if the file exists there.
    pub new_path: Option<String>,
    /// The kind of change.
    pub kind: ChangeKind,
    /// Hunk-level edits, in post-image line numbering.
    pub hunks: Vec<HunkEdit>,
}

/// A compact description of one [`DiffEntry`], per `toFileHeader` in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHeader {
    /// The effective path (new path if present, else old path).
    pub path: String,
    /// The kind of change.
    pub kind: ChangeKind,
    /// Number of hunks in the diff.
    pub hunk_count: usize,
}

/// The version-control capability (§6).
pub trait VersionControl {
    /// All tags, mapping tag name to the commit it points at.
    fn list_tags(&self) -> DpmResult<BTreeMap<String, String>>;

    /// Files at `commit` whose path ends with `suffix` and does not contain
    /// the substring "test" (case-insensitive), per §4.7.
    fn list_files(&self, commit: &str, suffix: &str) -> DpmResult<Vec<String>>;

    /// The raw bytes of `path` as of `commit`.
    fn read_file(&self, commit: &str, path: &str) -> DpmResult<Vec<u8>>;

    /// The commit log reachable from `head_commit`, optionally restricted to
    /// history touching `path`, newest first.
    fn commit_log(&self, head_commit: &str, path: Option<&str>) -> DpmResult<Vec<Commit>>;

    /// The diff between two commits' trees, with rename detection on.
    fn diff(&self, commit_a: &str, commit_b: &str) -> DpmResult<Vec<DiffEntry>>;

    /// A commit by its hash.
    fn find_commit(&self, id: &str) -> DpmResult<Commit>;

    /// Every commit reachable from any head (branch tip), per §4.3.
    fn all_reachable_commits(&self) -> DpmResult<Vec<Commit>>;
}

/// Render a compact [`FileHeader`] for a [`DiffEntry`].
pub fn to_file_header(entry: &DiffEntry) -> FileHeader {
    FileHeader {
        path: entry
            .new_path
            .clone()
            .or_else(|| entry.old_path.clone())
            .unwrap_or_default(),
        kind: entry.kind,
        hunk_count: entry.hunks.len(),
    }
}

/// A real, `git2`-backed [`VersionControl`] implementation.
pub struct GitVersionControl {
    repo: git2::Repository,
}

impl GitVersionControl {
    /// Open an existing local repository.
    pub fn open(local: &Path) -> DpmResult<Self> {
        let repo = git2::Repository::open(local).map_err(|e| DpmError::RepositoryOpenFailed {
            path: local.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Clone `remote` into `local`, then open it.
    pub fn clone_repo(remote: &str, local: &Path) -> DpmResult<Self> {
        let repo =
            git2::Repository::clone(remote, local).map_err(|e| DpmError::RepositoryOpenFailed {
                path: local.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { repo })
    }

    fn commit_from_git2(c: &git2::Commit) -> Commit {
        let time = c.author().when();
        let ts = Utc
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);
        Commit {
            id: c.id().to_string(),
            author: c.author().name().unwrap_or("unknown").to_string(),
            timestamp: ts,
            parents: c.parent_ids().map(|id| id.to_string()).collect(),
            message: c.message().unwrap_or_default().to_string(),
        }
    }

    fn diff_entries(&self, tree_a: Option<&git2::Tree>, tree_b: &git2::Tree) -> DpmResult<Vec<DiffEntry>> {
        let mut opts = git2::DiffOptions::new();
        let mut diff = self
            .repo
            .diff_tree_to_tree(tree_a, Some(tree_b), Some(&mut opts))?;

        let mut find_opts = git2::DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let mut entries: Vec<DiffEntry> = Vec::new();
        for (delta_idx, delta) in diff.deltas().enumerate() {
            let kind = match delta.status() {
                git2::Delta::Added => ChangeKind::Added,
                git2::Delta::Deleted => ChangeKind::Deleted,
                git2::Delta::Modified => ChangeKind::Modified,
                git2::Delta::Renamed => ChangeKind::Renamed,
                _ => ChangeKind::Other,
            };
            let old_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().to_string());
            let new_path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().to_string());
            entries.push(DiffEntry {
                old_path,
                new_path,
                kind,
                hunks: Vec::new(),
            });
            let _ = delta_idx;
        }

        // Walk hunks in a second pass; `foreach` gives us delta index implicitly
        // via call order matching `deltas()`.
        let current = std::cell::Cell::new(-1i32);
        diff.foreach(
            &mut |_delta, _progress| {
                current.set(current.get() + 1);
                true
            },
            None,
            Some(&mut |_delta, hunk| {
                if let Some(entry) = entries.get_mut(current.get().max(0) as usize) {
                    entry.hunks.push(HunkEdit {
                        old_start: hunk.old_start(),
                        old_lines: hunk.old_lines(),
                        new_start: hunk.new_start(),
                        new_lines: hunk.new_lines(),
                    });
                }
                true
            }),
            None,
        )?;

        Ok(entries)
    }
}

impl VersionControl for GitVersionControl {
    fn list_tags(&self) -> DpmResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();
            // Resolve annotated tags to the commit they point at.
            let commit_id = self
                .repo
                .find_tag(oid)
                .map(|t| t.target_id())
                .unwrap_or(oid);
            out.insert(name, commit_id.to_string());
            true
        })?;
        Ok(out)
    }

    fn list_files(&self, commit: &str, suffix: &str) -> DpmResult<Vec<String>> {
        let oid = git2::Oid::from_str(commit)?;
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;
        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    let path = format!("{root}{name}");
                    let lower = path.to_lowercase();
                    if path.ends_with(suffix) && !lower.contains("test") {
                        files.push(path);
                    }
                }
            }
            git2::TreeWalkResult::Ok
        })?;
        Ok(files)
    }

    fn read_file(&self, commit: &str, path: &str) -> DpmResult<Vec<u8>> {
        let oid = git2::Oid::from_str(commit)?;
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;
        let entry = tree.get_path(Path::new(path))?;
        let object = entry.to_object(&self.repo)?;
        let blob = object
            .as_blob()
            .ok_or_else(|| DpmError::ParseFailure {
                path: path.to_string(),
                reason: "tree entry is not a blob".to_string(),
            })?;
        Ok(blob.content().to_vec())
    }

    fn commit_log(&self, head_commit: &str, path: Option<&str>) -> DpmResult<Vec<Commit>> {
        let oid = git2::Oid::from_str(head_commit)?;
        let mut walk = self.repo.revwalk()?;
        walk.push(oid)?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        let mut out = Vec::new();
        for id in walk {
            let id = id?;
            let commit = self.repo.find_commit(id)?;
            if let Some(path) = path {
                if !self.commit_touches_path(&commit, path)? {
                    continue;
                }
            }
            out.push(Self::commit_from_git2(&commit));
        }
        Ok(out)
    }

    fn diff(&self, commit_a: &str, commit_b: &str) -> DpmResult<Vec<DiffEntry>> {
        let oid_a = git2::Oid::from_str(commit_a)?;
        let oid_b = git2::Oid::from_str(commit_b)?;
        let tree_a = self.repo.find_commit(oid_a)?.tree()?;
        let tree_b = self.repo.find_commit(oid_b)?.tree()?;
        self.diff_entries(Some(&tree_a), &tree_b)
    }

    fn find_commit(&self, id: &str) -> DpmResult<Commit> {
        let oid = git2::Oid::from_str(id)?;
        let commit = self.repo.find_commit(oid)?;
        Ok(Self::commit_from_git2(&commit))
    }

    fn all_reachable_commits(&self) -> DpmResult<Vec<Commit>> {
        let mut walk = self.repo.revwalk()?;
        walk.push_glob("refs/heads/*")?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for id in walk {
            let id = id?;
            if !seen.insert(id) {
                continue;
            }
            let commit = self.repo.find_commit(id)?;
            out.push(Self::commit_from_git2(&commit));
        }
        Ok(out)
    }
}

impl GitVersionControl {
    fn commit_touches_path(&self, commit: &git2::Commit, path: &str) -> DpmResult<bool> {
        let tree = commit.tree()?;
        if commit.parent_count() == 0 {
            return Ok(tree.get_path(Path::new(path)).is_ok());
        }
        let parent_tree = commit.parent(0)?.tree()?;
        let entries = self.diff_entries(Some(&parent_tree), &tree)?;
        Ok(entries
            .iter()
            .any(|e| e.new_path.as_deref() == Some(path)))
    }

    /// The local checkout path backing this handle, if file-backed.
    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(|p| p.to_path_buf())
    }
}
