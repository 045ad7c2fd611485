//! Stratified cross-validation, ROC-AUC, and Youden's J threshold search.
//!
//! Used by the orchestrator (§4.10, 10-repeat × 10-fold stratified CV over
//! the three candidates, then a nested sweep over the winner's single
//! hyperparameter) and by the what-if simulator (§4.12 step 2).

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::classifier::kind::ClassifierKind;
use crate::classifier::TrainingSet;
use crate::error::ModelResult;

/// Aggregate metrics from a cross-validation run, at the default 0.5
/// decision threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvMetrics {
    pub auc: f64,
    pub precision: f64,
    pub recall: f64,
}

impl CvMetrics {
    /// Selection order for the orchestrator (§4.10): AUC, then precision,
    /// then recall, all higher-is-better.
    fn better_than(&self, other: &CvMetrics) -> bool {
        (self.auc, self.precision, self.recall) > (other.auc, other.precision, other.recall)
    }
}

/// Split `n` row indices into `folds` stratified groups: each fold keeps
/// (approximately) the same positive/negative ratio as the full set.
fn stratified_folds(labels: &[bool], folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut positive: Vec<usize> = (0..labels.len()).filter(|&i| labels[i]).collect();
    let mut negative: Vec<usize> = (0..labels.len()).filter(|&i| !labels[i]).collect();
    positive.shuffle(&mut rng);
    negative.shuffle(&mut rng);

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); folds];
    for (i, idx) in positive.into_iter().enumerate() {
        buckets[i % folds].push(idx);
    }
    for (i, idx) in negative.into_iter().enumerate() {
        buckets[i % folds].push(idx);
    }
    buckets
}

/// Rank-based (Mann-Whitney) ROC-AUC over `(score, is_positive)` pairs.
/// Returns `0.5` (no discriminative power) if either class is empty.
pub fn roc_auc(scored: &[(f64, bool)]) -> f64 {
    let positives = scored.iter().filter(|(_, l)| *l).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut ranked: Vec<(f64, bool)> = scored.to_vec();
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut rank_sum_positive = 0.0;
    let mut i = 0;
    while i < ranked.len() {
        let mut j = i;
        while j + 1 < ranked.len() && ranked[j + 1].0 == ranked[i].0 {
            j += 1;
        }
        // Average rank (1-based) for this run of tied scores.
        let avg_rank = ((i + 1) + (j + 1)) as f64 / 2.0;
        for item in &ranked[i..=j] {
            if item.1 {
                rank_sum_positive += avg_rank;
            }
        }
        i = j + 1;
    }

    (rank_sum_positive - positives as f64 * (positives as f64 + 1.0) / 2.0)
        / (positives as f64 * negatives as f64)
}

/// Threshold maximising Youden's J (TPR − FPR), swept over midpoints
/// between adjacent unique scores (§4.12 step 2). Falls back to `0.5`
/// when the class is single-valued.
pub fn youdens_j_threshold(scored: &[(f64, bool)]) -> f64 {
    let positives = scored.iter().filter(|(_, l)| *l).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut scores: Vec<f64> = scored.iter().map(|(s, _)| *s).collect();
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
    scores.dedup();
    if scores.len() < 2 {
        return 0.5;
    }

    let mut best_threshold = 0.5;
    let mut best_j = f64::NEG_INFINITY;
    for window in scores.windows(2) {
        let threshold = (window[0] + window[1]) / 2.0;
        let tp = scored.iter().filter(|(s, l)| *l && *s >= threshold).count();
        let fp = scored.iter().filter(|(s, l)| !*l && *s >= threshold).count();
        let j = (tp as f64 / positives as f64) - (fp as f64 / negatives as f64);
        if j > best_j {
            best_j = j;
            best_threshold = threshold;
        }
    }
    best_threshold
}

fn precision_recall(scored: &[(f64, bool)], threshold: f64) -> (f64, f64) {
    let tp = scored.iter().filter(|(s, l)| *l && *s >= threshold).count();
    let fp = scored.iter().filter(|(s, l)| !*l && *s >= threshold).count();
    let fn_ = scored.iter().filter(|(s, l)| *l && *s < threshold).count();
    let precision = if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 };
    let recall = if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 };
    (precision, recall)
}

/// Run `repeats` independent stratified `folds`-fold cross-validations of
/// `kind` with `options` over `data`, pooling out-of-fold predictions into
/// one AUC/precision/recall triple (§4.10).
pub fn cross_validate(
    kind: ClassifierKind,
    options: &str,
    data: &TrainingSet,
    repeats: usize,
    folds: usize,
    seed: u64,
) -> ModelResult<CvMetrics> {
    let labels: Vec<bool> = data.rows.iter().map(|r| r.label).collect();
    let mut pooled: Vec<(f64, bool)> = Vec::new();

    for repeat in 0..repeats {
        let buckets = stratified_folds(&labels, folds, seed.wrapping_add(repeat as u64));
        for (fold_index, held_out) in buckets.iter().enumerate() {
            if held_out.is_empty() {
                continue;
            }
            let train_rows: Vec<_> = buckets
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_index)
                .flat_map(|(_, b)| b.iter().map(|&i| data.rows[i].clone()))
                .collect();
            if train_rows.is_empty() {
                continue;
            }
            let train_set = TrainingSet::new(train_rows);
            let mut clf = kind.build();
            clf.set_options(options)?;
            if clf.train(&train_set).is_err() {
                continue;
            }
            for &idx in held_out {
                if let Ok(p) = clf.predict_probability(&data.rows[idx].features) {
                    pooled.push((p, data.rows[idx].label));
                }
            }
        }
    }

    let auc = roc_auc(&pooled);
    let (precision, recall) = precision_recall(&pooled, 0.5);
    Ok(CvMetrics { auc, precision, recall })
}

/// Sweep `candidates` (option strings) for `kind`, returning the
/// best-performing option string and its metrics (§4.10's nested tuning
/// search). `candidates` must be non-empty.
pub fn tune_hyperparameter(
    kind: ClassifierKind,
    data: &TrainingSet,
    candidates: &[String],
    repeats: usize,
    folds: usize,
    seed: u64,
) -> ModelResult<(String, CvMetrics)> {
    let mut best: Option<(String, CvMetrics)> = None;
    for options in candidates {
        let metrics = cross_validate(kind, options, data, repeats, folds, seed)?;
        if best.as_ref().map(|(_, m)| metrics.better_than(m)).unwrap_or(true) {
            best = Some((options.clone(), metrics));
        }
    }
    Ok(best.expect("candidates is non-empty"))
}
