//! Preprocessor (component 9, §4.9).
//!
//! Operates on the numeric feature matrix only (identifier columns already
//! dropped by the caller, per step 1 of §4.9 — the dataset assembler never
//! emits them into the `Dataset` the preprocessor consumes).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Dataset, NUMERIC_FEATURE_COLUMNS};

/// Fixed seed for minority-class oversampling (§4.9 step 7, §9).
pub const OVERSAMPLE_SEED: u64 = 42;
/// Minority ratio below which oversampling triggers.
pub const OVERSAMPLE_TRIGGER_RATIO: f64 = 0.20;
/// Target minority ratio after oversampling.
pub const OVERSAMPLE_TARGET_RATIO: f64 = 0.30;

/// One feature's information-gain ranking entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    /// Column name.
    pub name: String,
    /// Column index in the dataset (before any top-k truncation).
    pub column_index: usize,
    /// Information gain against the class attribute.
    pub information_gain: f64,
}

/// Impute missing values (represented as `f64::NAN`) with the column mean,
/// in place (§4.9 step 2).
pub fn impute_missing(dataset: &mut Dataset) {
    let class_index = dataset.class_index();
    for col in 0..class_index {
        let values: Vec<f64> = dataset
            .rows
            .iter()
            .map(|r| r[col])
            .filter(|v| !v.is_nan())
            .collect();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        for row in dataset.rows.iter_mut() {
            if row[col].is_nan() {
                row[col] = mean;
            }
        }
    }
}

/// Min-max normalise every numeric (non-class) column to `[0, 1]`, in place
/// (§4.9 step 3). A constant column normalises to all zeros.
pub fn normalize(dataset: &mut Dataset) {
    let class_index = dataset.class_index();
    for col in 0..class_index {
        let (min, max) = dataset
            .rows
            .iter()
            .map(|r| r[col])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        for row in dataset.rows.iter_mut() {
            row[col] = if range > 0.0 { (row[col] - min) / range } else { 0.0 };
        }
    }
}

/// Information gain of splitting the class attribute on `column`, computed
/// via a single binary split at the column's mean (a lightweight surrogate
/// for full multi-way IG, adequate once the column is already min-max
/// normalised).
fn information_gain(dataset: &Dataset, column: usize) -> f64 {
    let class_index = dataset.class_index();
    let n = dataset.rows.len();
    if n == 0 {
        return 0.0;
    }

    let entropy = |positive: usize, total: usize| -> f64 {
        if total == 0 || positive == 0 || positive == total {
            return 0.0;
        }
        let p = positive as f64 / total as f64;
        -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
    };

    let total_positive = dataset.rows.iter().filter(|r| r[class_index] >= 0.5).count();
    let base_entropy = entropy(total_positive, n);

    let mean = dataset.rows.iter().map(|r| r[column]).sum::<f64>() / n as f64;
    let (mut left_total, mut left_positive) = (0usize, 0usize);
    let (mut right_total, mut right_positive) = (0usize, 0usize);
    for row in &dataset.rows {
        let positive = row[class_index] >= 0.5;
        if row[column] <= mean {
            left_total += 1;
            left_positive += positive as usize;
        } else {
            right_total += 1;
            right_positive += positive as usize;
        }
    }

    let weighted = (left_total as f64 / n as f64) * entropy(left_positive, left_total)
        + (right_total as f64 / n as f64) * entropy(right_positive, right_total);

    (base_entropy - weighted).max(0.0)
}

/// Rank all numeric feature columns by information gain against the class
/// attribute, descending (§4.9 step 4, §4.11).
pub fn rank_features(dataset: &Dataset) -> Vec<RankedFeature> {
    let class_index = dataset.class_index();
    let mut ranked: Vec<RankedFeature> = (0..class_index)
        .map(|col| RankedFeature {
            name: dataset
                .columns
                .get(col)
                .cloned()
                .unwrap_or_else(|| NUMERIC_FEATURE_COLUMNS.get(col).unwrap_or(&"?").to_string()),
            column_index: col,
            information_gain: information_gain(dataset, col),
        })
        .collect();
    ranked.sort_by(|a, b| b.information_gain.partial_cmp(&a.information_gain).unwrap());
    ranked
}

/// Retain only the top-`k` ranked feature columns plus the class column, in
/// ranking order followed by the class (§4.9 step 4).
pub fn select_top_k(dataset: &Dataset, ranking: &[RankedFeature], k: usize) -> Dataset {
    let class_index = dataset.class_index();
    let keep: Vec<usize> = ranking.iter().take(k).map(|r| r.column_index).collect();

    let mut columns: Vec<String> = keep.iter().map(|&i| dataset.columns[i].clone()).collect();
    columns.push(dataset.columns[class_index].clone());

    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            let mut new_row: Vec<f64> = keep.iter().map(|&i| row[i]).collect();
            new_row.push(row[class_index]);
            new_row
        })
        .collect();

    Dataset { columns, rows }
}

/// Random-oversample the minority ("yes") class with a fixed seed until its
/// share reaches `OVERSAMPLE_TARGET_RATIO`, only if the current minority
/// ratio is below `OVERSAMPLE_TRIGGER_RATIO` (§4.9 step 7). Returns `None`
/// when oversampling does not trigger.
pub fn oversample_if_imbalanced(dataset: &Dataset) -> Option<Dataset> {
    let ratio = dataset.minority_ratio();
    if ratio >= OVERSAMPLE_TRIGGER_RATIO || dataset.rows.is_empty() {
        return None;
    }

    let class_index = dataset.class_index();
    let minority: Vec<&Vec<f64>> = dataset
        .rows
        .iter()
        .filter(|r| r[class_index] >= 0.5)
        .collect();
    if minority.is_empty() {
        return None;
    }

    let mut rows = dataset.rows.clone();
    let mut rng = StdRng::seed_from_u64(OVERSAMPLE_SEED);

    let original_total = rows.len();
    let mut minority_count = minority.len();
    while (minority_count as f64) / (rows.len() as f64) < OVERSAMPLE_TARGET_RATIO {
        let pick = minority[rng.gen_range(0..minority.len())];
        rows.push(pick.clone());
        minority_count += 1;
        if rows.len() > original_total * 10 {
            // Pathological safety valve; never hit in practice for a
            // ratio target below 1.0.
            break;
        }
    }

    Some(Dataset {
        columns: dataset.columns.clone(),
        rows,
    })
}
