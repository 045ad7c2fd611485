//! Classifier orchestrator (component 10, §4.10).
//!
//! Trains the three candidates via stratified cross-validation, selects the
//! winner by weighted AUC (ties: precision, then recall, then the fixed
//! order tree/bayes/knn), tunes the winner's single hyperparameter by a
//! nested sweep, and persists the result. An existing artefact short-circuits
//! the whole process (§5, §7).

use std::path::Path;

use dpm_db::ArtifactStore;
use dpm_model::{cross_validate, tune_hyperparameter, ClassifierKind, CvMetrics, TrainedModelDescriptor, TrainingSet};

use crate::config::TunerConfig;
use crate::errors::{DpmError, DpmResult};
use crate::types::Dataset;

const CV_REPEATS: usize = 10;
const CV_FOLDS: usize = 10;
const CV_SEED: u64 = 2024;

/// The selected, tuned classifier plus the cross-validation metrics that
/// justified the choice.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub descriptor: TrainedModelDescriptor,
    pub metrics: CvMetrics,
}

fn to_training_set(dataset: &Dataset) -> TrainingSet {
    let class_index = dataset.class_index();
    let rows = dataset
        .rows
        .iter()
        .map(|row| dpm_model::TrainingRow {
            features: row[..class_index].to_vec(),
            label: row[class_index] >= 0.5,
        })
        .collect();
    TrainingSet::new(rows)
}

/// Evaluate all three candidates at their default options, returning each
/// kind's pooled cross-validation metrics (§4.10's candidate round).
fn evaluate_candidates(data: &TrainingSet) -> DpmResult<Vec<(ClassifierKind, CvMetrics)>> {
    ClassifierKind::ALL
        .iter()
        .map(|&kind| {
            let metrics = cross_validate(kind, &kind.default_options(), data, CV_REPEATS, CV_FOLDS, CV_SEED)
                .map_err(|e| DpmError::ThresholdCalibrationFailure { reason: e.to_string() })?;
            Ok((kind, metrics))
        })
        .collect()
}

/// Pick the best candidate by (AUC, precision, recall), breaking remaining
/// ties by `ClassifierKind::ALL`'s fixed order (first candidate wins ties,
/// since candidates are evaluated in that fixed order).
fn select_winner(candidates: &[(ClassifierKind, CvMetrics)]) -> (ClassifierKind, CvMetrics) {
    let mut best = candidates.first().copied().expect("ClassifierKind::ALL is non-empty");
    for &(kind, metrics) in &candidates[1..] {
        if (metrics.auc, metrics.precision, metrics.recall) > (best.1.auc, best.1.precision, best.1.recall) {
            best = (kind, metrics);
        }
    }
    best
}

/// Build the nested-tuning candidate option strings for `kind` from the
/// configured sweep range (§4.10, §6).
fn candidate_options(kind: ClassifierKind, tuner: &TunerConfig) -> DpmResult<Vec<String>> {
    match kind {
        ClassifierKind::Tree => crate::config::SweepRange::parse(&tuner.randomforest.iterations_range)
            .map(|r| r.values().into_iter().map(|n| format!("-I {n}")).collect()),
        ClassifierKind::Knn => crate::config::SweepRange::parse(&tuner.ibk.k_range)
            .map(|r| r.values().into_iter().map(|k| format!("-K {k}")).collect()),
        ClassifierKind::Bayes => Ok(vec![ClassifierKind::Bayes.default_options()]),
    }
}

/// Run the full orchestration: candidate evaluation, winner selection,
/// nested tuning, and persistence. Returns the cached descriptor without
/// retraining if `model_path` already holds a non-empty artefact.
pub fn orchestrate(
    store: &dyn ArtifactStore,
    model_path: &Path,
    dataset: &Dataset,
    tuner: &TunerConfig,
) -> DpmResult<OrchestrationResult> {
    if store.exists_and_nonempty(model_path) {
        let bytes = store.read_blob(model_path)?;
        let descriptor = TrainedModelDescriptor::from_bytes(&bytes)
            .map_err(|e| DpmError::persistence_failure(model_path.display().to_string(), e.to_string()))?;
        let data = to_training_set(dataset);
        let metrics = cross_validate(descriptor.kind, &descriptor.options, &data, CV_REPEATS, CV_FOLDS, CV_SEED)
            .map_err(|e| DpmError::ThresholdCalibrationFailure { reason: e.to_string() })?;
        return Ok(OrchestrationResult { descriptor, metrics });
    }

    let data = to_training_set(dataset);
    if data.is_empty() {
        return Err(DpmError::InsufficientData {
            reason: "preprocessed dataset has no rows to train on".to_string(),
        });
    }

    let candidates = evaluate_candidates(&data)?;
    let (winner_kind, mut winner_metrics) = select_winner(&candidates);

    let mut winner_options = winner_kind.default_options();
    if winner_kind.is_tunable() {
        let sweep = candidate_options(winner_kind, tuner)?;
        let (tuned_options, tuned_metrics) =
            tune_hyperparameter(winner_kind, &data, &sweep, CV_REPEATS, CV_FOLDS, CV_SEED)
                .map_err(|e| DpmError::ThresholdCalibrationFailure { reason: e.to_string() })?;
        winner_options = tuned_options;
        winner_metrics = tuned_metrics;
    }

    let descriptor = TrainedModelDescriptor::new(winner_kind, winner_options);
    let bytes = descriptor
        .to_bytes()
        .map_err(|e| DpmError::persistence_failure(model_path.display().to_string(), e.to_string()))?;
    store.write_blob(model_path, &bytes)?;

    Ok(OrchestrationResult { descriptor, metrics: winner_metrics })
}
