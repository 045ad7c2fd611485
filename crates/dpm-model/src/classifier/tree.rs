//! Ensemble (bagged, random-feature-subset) decision tree classifier.
//!
//! The iteration-count hyperparameter (§4.10) is the number of bootstrap
//! trees in the ensemble; prediction is the fraction of trees voting for
//! the positive class.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::classifier::kind::ClassifierKind;
use crate::classifier::{Classifier, TrainingRow, TrainingSet};
use crate::config::TreeOptions;
use crate::error::{ModelError, ModelResult};

const MAX_DEPTH: u32 = 6;
const MIN_SAMPLES_SPLIT: usize = 4;
/// Fixed so a given (dataset, options) pair always builds the same forest.
const BAGGING_SEED: u64 = 1_337;

#[derive(Debug, Clone)]
enum Node {
    Leaf { positive_rate: f64 },
    Split { feature: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
}

impl Node {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            Node::Leaf { positive_rate } => *positive_rate,
            Node::Split { feature, threshold, left, right } => {
                if features[*feature] <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

fn build_node(rows: &[&TrainingRow], feature_subset: &[usize], depth: u32) -> Node {
    let total = rows.len();
    let positives = rows.iter().filter(|r| r.label).count();
    let positive_rate = if total == 0 { 0.0 } else { positives as f64 / total as f64 };

    if depth >= MAX_DEPTH || total < MIN_SAMPLES_SPLIT || positives == 0 || positives == total {
        return Node::Leaf { positive_rate };
    }

    let parent_impurity = gini(positives, total);
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

    for &feature in feature_subset {
        let mut values: Vec<f64> = rows.iter().map(|r| r.features[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        for window in values.windows(2) {
            let threshold = (window[0] + window[1]) / 2.0;
            let (mut left_total, mut left_pos) = (0usize, 0usize);
            let (mut right_total, mut right_pos) = (0usize, 0usize);
            for row in rows {
                if row.features[feature] <= threshold {
                    left_total += 1;
                    left_pos += row.label as usize;
                } else {
                    right_total += 1;
                    right_pos += row.label as usize;
                }
            }
            if left_total == 0 || right_total == 0 {
                continue;
            }
            let weighted = (left_total as f64 / total as f64) * gini(left_pos, left_total)
                + (right_total as f64 / total as f64) * gini(right_pos, right_total);
            let gain = parent_impurity - weighted;
            if best.map(|(_, _, best_gain)| gain > best_gain).unwrap_or(true) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    match best {
        Some((feature, threshold, gain)) if gain > 1e-9 => {
            let (left_rows, right_rows): (Vec<&TrainingRow>, Vec<&TrainingRow>) = rows
                .iter()
                .partition(|r| r.features[feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(build_node(&left_rows, feature_subset, depth + 1)),
                right: Box::new(build_node(&right_rows, feature_subset, depth + 1)),
            }
        }
        _ => Node::Leaf { positive_rate },
    }
}

/// Bagged ensemble of depth-limited decision trees.
#[derive(Debug, Default)]
pub struct EnsembleTreeClassifier {
    options: TreeOptions,
    trees: Vec<Node>,
}

impl EnsembleTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for EnsembleTreeClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Tree
    }

    fn options(&self) -> String {
        self.options.to_option_string()
    }

    fn set_options(&mut self, options: &str) -> ModelResult<()> {
        self.options = TreeOptions::from_option_string(options)?;
        Ok(())
    }

    fn train(&mut self, data: &TrainingSet) -> ModelResult<()> {
        if data.is_empty() {
            return Err(ModelError::insufficient_data("tree", "no training rows"));
        }
        let feature_count = data.feature_count();
        let subset_size = (feature_count as f64).sqrt().ceil().max(1.0) as usize;
        let mut rng = Pcg64::seed_from_u64(BAGGING_SEED);

        self.trees = (0..self.options.iterations)
            .map(|_| {
                let bootstrap: Vec<&TrainingRow> = (0..data.len())
                    .map(|_| &data.rows[rng.gen_range(0..data.len())])
                    .collect();
                let mut features: Vec<usize> = (0..feature_count).collect();
                features.shuffle(&mut rng);
                features.truncate(subset_size.min(feature_count).max(1));
                build_node(&bootstrap, &features, 0)
            })
            .collect();
        Ok(())
    }

    fn predict_probability(&self, features: &[f64]) -> ModelResult<f64> {
        if self.trees.is_empty() {
            return Err(ModelError::not_trained("tree"));
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(features: Vec<f64>, label: bool) -> TrainingRow {
        TrainingRow { features, label }
    }

    #[test]
    fn learns_a_perfectly_separable_split() {
        let data = TrainingSet::new(vec![
            row(vec![0.0], false),
            row(vec![0.1], false),
            row(vec![0.2], false),
            row(vec![0.9], true),
            row(vec![1.0], true),
            row(vec![1.1], true),
        ]);
        let mut clf = EnsembleTreeClassifier::new();
        clf.set_options("-I 10").unwrap();
        clf.train(&data).unwrap();
        assert!(clf.predict_probability(&[1.0]).unwrap() > 0.5);
        assert!(clf.predict_probability(&[0.0]).unwrap() < 0.5);
    }

    #[test]
    fn untrained_classifier_rejects_prediction() {
        let clf = EnsembleTreeClassifier::new();
        assert!(clf.predict_probability(&[0.0]).is_err());
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let mut clf = EnsembleTreeClassifier::new();
        assert!(clf.train(&TrainingSet::default()).is_err());
    }
}
