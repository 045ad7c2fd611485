//! Integration tests for the `dpm release-index` command, against a real
//! on-disk git repository built with the `git` binary.

mod common;

use std::process::Command as StdCommand;

use predicates::prelude::*;
use tempfile::TempDir;

use common::dpm_cmd;

fn git(repo: &std::path::Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(repo)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git must be on PATH for this test");
    assert!(status.success(), "git {args:?} failed");
}

fn tagged_repo_with_two_releases(dir: &std::path::Path) {
    git(dir, &["init", "-q"]);
    std::fs::write(dir.join("Foo.java"), "class Foo { void bar() {} }").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "first"]);
    git(dir, &["tag", "1.0.0"]);
    std::fs::write(dir.join("Foo.java"), "class Foo { void bar() { bar(); } }").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "second"]);
    git(dir, &["tag", "1.1.0"]);
}

#[test]
fn release_index_lists_tags_in_chronological_order() {
    let temp = TempDir::new().expect("create temp dir");
    tagged_repo_with_two_releases(temp.path());

    dpm_cmd()
        .args(["release-index", "--repo"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0.0").and(predicate::str::contains("1.1.0")));
}

#[test]
fn release_index_on_an_unreleased_repo_fails() {
    let temp = TempDir::new().expect("create temp dir");
    git(temp.path(), &["init", "-q"]);

    dpm_cmd()
        .args(["release-index", "--repo"])
        .arg(temp.path())
        .assert()
        .failure();
}
