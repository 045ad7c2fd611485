//! Gaussian naive Bayes classifier. Has no tunable hyperparameter (§4.10).

use crate::classifier::kind::ClassifierKind;
use crate::classifier::{Classifier, TrainingSet};
use crate::config::BayesOptions;
use crate::error::{ModelError, ModelResult};

const VARIANCE_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct FeatureStats {
    mean: f64,
    variance: f64,
}

fn gaussian_log_likelihood(x: f64, stats: FeatureStats) -> f64 {
    let variance = stats.variance.max(VARIANCE_FLOOR);
    let diff = x - stats.mean;
    -0.5 * (2.0 * std::f64::consts::PI * variance).ln() - (diff * diff) / (2.0 * variance)
}

fn fit_class(rows: &[&Vec<f64>], feature_count: usize) -> Vec<FeatureStats> {
    (0..feature_count)
        .map(|f| {
            let values: Vec<f64> = rows.iter().map(|r| r[f]).collect();
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            FeatureStats { mean, variance }
        })
        .collect()
}

/// Per-class Gaussian feature statistics plus class priors.
#[derive(Debug, Default)]
pub struct NaiveBayesClassifier {
    options: BayesOptions,
    positive: Vec<FeatureStats>,
    negative: Vec<FeatureStats>,
    prior_positive: f64,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for NaiveBayesClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Bayes
    }

    fn options(&self) -> String {
        self.options.to_option_string()
    }

    fn set_options(&mut self, options: &str) -> ModelResult<()> {
        self.options = BayesOptions::from_option_string(options)?;
        Ok(())
    }

    fn train(&mut self, data: &TrainingSet) -> ModelResult<()> {
        if data.is_empty() {
            return Err(ModelError::insufficient_data("bayes", "no training rows"));
        }
        let feature_count = data.feature_count();
        let positive_rows: Vec<&Vec<f64>> = data
            .rows
            .iter()
            .filter(|r| r.label)
            .map(|r| &r.features)
            .collect();
        let negative_rows: Vec<&Vec<f64>> = data
            .rows
            .iter()
            .filter(|r| !r.label)
            .map(|r| &r.features)
            .collect();
        if positive_rows.is_empty() || negative_rows.is_empty() {
            return Err(ModelError::insufficient_data(
                "bayes",
                "training set must contain both classes",
            ));
        }

        self.prior_positive = positive_rows.len() as f64 / data.len() as f64;
        self.positive = fit_class(&positive_rows, feature_count);
        self.negative = fit_class(&negative_rows, feature_count);
        Ok(())
    }

    fn predict_probability(&self, features: &[f64]) -> ModelResult<f64> {
        if self.positive.is_empty() || self.negative.is_empty() {
            return Err(ModelError::not_trained("bayes"));
        }
        let log_pos = self.prior_positive.ln()
            + features
                .iter()
                .zip(&self.positive)
                .map(|(&x, &s)| gaussian_log_likelihood(x, s))
                .sum::<f64>();
        let log_neg = (1.0 - self.prior_positive).ln()
            + features
                .iter()
                .zip(&self.negative)
                .map(|(&x, &s)| gaussian_log_likelihood(x, s))
                .sum::<f64>();

        // log-sum-exp normalisation into a probability.
        let max_log = log_pos.max(log_neg);
        let pos = (log_pos - max_log).exp();
        let neg = (log_neg - max_log).exp();
        Ok(pos / (pos + neg))
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
    fn separates_two_well_separated_gaussians() {
        let data = TrainingSet::new(vec![
            row(vec![0.0], false),
            row(vec![0.2], false),
            row(vec![-0.1], false),
            row(vec![10.0], true),
            row(vec![10.2], true),
            row(vec![9.9], true),
        ]);
        let mut clf = NaiveBayesClassifier::new();
        clf.train(&data).unwrap();
        assert!(clf.predict_probability(&[10.0]).unwrap() > 0.9);
        assert!(clf.predict_probability(&[0.0]).unwrap() < 0.1);
    }

    #[test]
    fn single_class_training_set_is_rejected() {
        let data = TrainingSet::new(vec![row(vec![0.0], false), row(vec![1.0], false)]);
        let mut clf = NaiveBayesClassifier::new();
        assert!(clf.train(&data).is_err());
    }
}
