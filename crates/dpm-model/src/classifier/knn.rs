//! IBk-style lazy k-nearest-neighbour classifier.

use crate::classifier::kind::ClassifierKind;
use crate::classifier::{Classifier, TrainingSet};
use crate::config::KnnOptions;
use crate::error::{ModelError, ModelResult};

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Stores the training set verbatim; all work happens at prediction time.
#[derive(Debug, Default)]
pub struct KnnClassifier {
    options: KnnOptions,
    data: TrainingSet,
}

impl KnnClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for KnnClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Knn
    }

    fn options(&self) -> String {
        self.options.to_option_string()
    }

    fn set_options(&mut self, options: &str) -> ModelResult<()> {
        self.options = KnnOptions::from_option_string(options)?;
        Ok(())
    }

    fn train(&mut self, data: &TrainingSet) -> ModelResult<()> {
        if data.is_empty() {
            return Err(ModelError::insufficient_data("knn", "no training rows"));
        }
        self.data = data.clone();
        Ok(())
    }

    fn predict_probability(&self, features: &[f64]) -> ModelResult<f64> {
        if self.data.is_empty() {
            return Err(ModelError::not_trained("knn"));
        }
        let k = self.options.k.min(self.data.len()).max(1);
        let mut distances: Vec<(f64, bool)> = self
            .data
            .rows
            .iter()
            .map(|r| (squared_distance(features, &r.features), r.label))
            .collect();
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let positives = distances.iter().take(k).filter(|(_, label)| *label).count();
        Ok(positives as f64 / k as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TrainingRow;

    fn row(features: Vec<f64>, label: bool) -> TrainingRow {
        TrainingRow { features, label }
    }

    #[test]
    fn nearest_neighbours_determine_the_vote() {
        let data = TrainingSet::new(vec![
            row(vec![0.0], false),
            row(vec![0.1], false),
            row(vec![0.2], false),
            row(vec![9.0], true),
            row(vec![9.1], true),
            row(vec![9.2], true),
        ]);
        let mut clf = KnnClassifier::new();
        clf.set_options("-K 3").unwrap();
        clf.train(&data).unwrap();
        assert_eq!(clf.predict_probability(&[9.05]).unwrap(), 1.0);
        assert_eq!(clf.predict_probability(&[0.05]).unwrap(), 0.0);
    }

    #[test]
    fn k_larger_than_dataset_is_clamped() {
        let data = TrainingSet::new(vec![row(vec![0.0], true), row(vec![1.0], false)]);
        let mut clf = KnnClassifier::new();
        clf.set_options("-K 50").unwrap();
        clf.train(&data).unwrap();
        assert!(clf.predict_probability(&[0.5]).is_ok());
    }
}
