//! Integration tests for the staged `dpm preprocess` / `dpm train` /
//! `dpm simulate` subcommands, each operating on an artefact produced by
//! the previous stage rather than a full `dpm run`.

mod common;

use dpm_core::types::FeatureRecord;
use predicates::prelude::*;
use tempfile::TempDir;

use common::dpm_cmd;

/// A small, separable raw dataset: low code-smell counts are clean, high
/// ones are buggy, enough rows for the classifier orchestrator's 10-fold
/// cross-validation to run without an `InsufficientData` fallback.
fn synthetic_records() -> Vec<FeatureRecord> {
    let mut records = Vec::new();
    for i in 0..15u32 {
        records.push(FeatureRecord {
            project: "Demo".to_string(),
            method_name: format!("Foo.java::clean{i}()"),
            release: "1.0.0".to_string(),
            code_smells: 0,
            cyclomatic_complexity: 1,
            parameter_count: 1,
            duplication: 0,
            nr: 1,
            n_auth: 1,
            stmt_added: 1,
            stmt_deleted: 0,
            max_churn: 1,
            avg_churn: 1.0,
            is_buggy: false,
        });
        records.push(FeatureRecord {
            project: "Demo".to_string(),
            method_name: format!("Foo.java::buggy{i}()"),
            release: "1.0.0".to_string(),
            code_smells: 10,
            cyclomatic_complexity: 12,
            parameter_count: 6,
            duplication: 5,
            nr: 8,
            n_auth: 4,
            stmt_added: 40,
            stmt_deleted: 20,
            max_churn: 30,
            avg_churn: 15.0,
            is_buggy: true,
        });
    }
    records
}

#[test]
fn preprocess_train_simulate_pipeline_runs_end_to_end() {
    let temp = TempDir::new().expect("create temp dir");
    let store = dpm_db::FileArtifactStore::new();
    let paths = dpm_db::ArtefactPaths::new("Demo", temp.path());
    dpm_core::dataset::write_dataset(&store, &paths.raw_dataset(), &synthetic_records()).unwrap();

    dpm_cmd()
        .args(["preprocess", "--project", "Demo", "--out"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Preprocessed Demo"));
    assert!(paths.processed_dataset().exists());

    dpm_cmd()
        .args(["train", "--project", "Demo", "--out"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Trained Demo"));
    assert!(paths.trained_model().exists());

    dpm_cmd()
        .args(["simulate", "--project", "Demo", "--out"])
        .arg(temp.path())
        .assert()
        .success();
    assert!(paths.refactored_method_source().exists());
}

#[test]
fn preprocess_without_a_raw_dataset_fails() {
    let temp = TempDir::new().expect("create temp dir");

    dpm_cmd()
        .args(["preprocess", "--project", "Demo", "--out"])
        .arg(temp.path())
        .assert()
        .failure();
}
