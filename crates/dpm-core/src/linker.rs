//! Commit-to-ticket linker (component 3, §4.3).

use std::collections::HashMap;

use regex::Regex;

use crate::types::{BugTicket, Commit};
use crate::vcs::VersionControl;

fn ticket_key_regex() -> Regex {
    Regex::new(r"[A-Z][A-Z0-9]+-\d+").expect("static regex is valid")
}

/// Link commits to tickets (component 3).
///
/// Scans every commit reachable from any head (§4.3's "entire commit DAG")
/// for ticket-key references in the commit message. For each match whose key
/// is in the catalogue and whose current fix commit is absent, records this
/// commit's hash as the fix commit and its author timestamp as the
/// resolution timestamp. First match wins: later commits referencing the
/// same ticket never overwrite an already-linked ticket.
pub fn link_commits_to_tickets(vcs: &dyn VersionControl, tickets: &mut [BugTicket]) -> crate::errors::DpmResult<()> {
    let commits = vcs.all_reachable_commits()?;
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (i, t) in tickets.iter().enumerate() {
        by_key.insert(t.key.clone(), i);
    }

    let key_re = ticket_key_regex();
    for commit in &commits {
        link_one_commit(commit, &key_re, tickets, &by_key);
    }

    Ok(())
}

fn link_one_commit(
    commit: &Commit,
    key_re: &Regex,
    tickets: &mut [BugTicket],
    by_key: &HashMap<String, usize>,
) {
    for m in key_re.find_iter(&commit.message) {
        let key = m.as_str();
        let Some(&idx) = by_key.get(key) else {
            continue;
        };
        let ticket = &mut tickets[idx];
        if ticket.fix_commit.is_some() {
            continue;
        }
        ticket.fix_commit = Some(commit.id.clone());
        ticket.resolved = Some(commit.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DpmResult;
    use crate::vcs::DiffEntry;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    struct FakeVcs {
        commits: Vec<Commit>,
    }

    impl VersionControl for FakeVcs {
        fn list_tags(&self) -> DpmResult<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }
        fn list_files(&self, _commit: &str, _suffix: &str) -> DpmResult<Vec<String>> {
            Ok(vec![])
        }
        fn read_file(&self, _commit: &str, _path: &str) -> DpmResult<Vec<u8>> {
            Ok(vec![])
        }
        fn commit_log(&self, _head: &str, _path: Option<&str>) -> DpmResult<Vec<Commit>> {
            Ok(self.commits.clone())
        }
        fn diff(&self, _a: &str, _b: &str) -> DpmResult<Vec<DiffEntry>> {
            Ok(vec![])
        }
        fn find_commit(&self, id: &str) -> DpmResult<Commit> {
            self.commits
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| crate::errors::DpmError::ConfigInvalid {
                    message: "not found".to_string(),
                })
        }
        fn all_reachable_commits(&self) -> DpmResult<Vec<Commit>> {
            Ok(self.commits.clone())
        }
    }

    fn commit(id: &str, message: &str, ts: i64) -> Commit {
        Commit {
            id: id.to_string(),
            author: "alice".to_string(),
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            parents: vec![],
            message: message.to_string(),
        }
    }

    fn ticket(key: &str) -> BugTicket {
        BugTicket {
            key: key.to_string(),
            created: Utc.timestamp_opt(0, 0).unwrap(),
            resolved: None,
            affected_versions: vec![],
            opening_version: None,
            fixed_version: None,
            introduction_version: None,
            fix_commit: None,
        }
    }

    #[test]
    fn first_match_wins() {
        let vcs = FakeVcs {
            commits: vec![
                commit("c1", "fix for PROJ-1", 100),
                commit("c2", "also references PROJ-1 again", 200),
            ],
        };
        let mut tickets = vec![ticket("PROJ-1")];
        link_commits_to_tickets(&vcs, &mut tickets).unwrap();
        assert_eq!(tickets[0].fix_commit.as_deref(), Some("c1"));
        assert_eq!(tickets[0].resolved, Some(Utc.timestamp_opt(100, 0).unwrap()));
    }

    #[test]
    fn unmatched_keys_are_ignored() {
        let vcs = FakeVcs {
            commits: vec![commit("c1", "refactor unrelated code", 100)],
        };
        let mut tickets = vec![ticket("PROJ-1")];
        link_commits_to_tickets(&vcs, &mut tickets).unwrap();
        assert!(tickets[0].fix_commit.is_none());
    }
}
