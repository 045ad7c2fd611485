//! The classifier capability: a kind-polymorphic `train` / `predict` surface
//! plus the three concrete variants behind a tagged `ClassifierKind`.

pub mod bayes;
pub mod knn;
pub mod kind;
pub mod tree;

use crate::error::ModelResult;

/// One labelled training example: a numeric feature row plus its class
/// (`true` == the "yes"/minority/buggy class).
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: Vec<f64>,
    pub label: bool,
}

/// A feature matrix ready for training or evaluation. All rows must share
/// `features.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<TrainingRow>,
}

impl TrainingSet {
    pub fn new(rows: Vec<TrainingRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.rows.iter().filter(|r| r.label).count()
    }

    pub fn feature_count(&self) -> usize {
        self.rows.first().map(|r| r.features.len()).unwrap_or(0)
    }
}

/// A trained or trainable classifier, kind-erased behind a trait object so
/// the orchestrator can hold a `Vec<Box<dyn Classifier>>` of candidates.
///
/// Mirrors the original system's `Classifier` contract: `buildClassifier`,
/// `distributionForInstance`, `getOptions`/`setOptions`, persistence.
pub trait Classifier: Send + Sync {
    /// The tag identifying this classifier's concrete kind.
    fn kind(&self) -> kind::ClassifierKind;

    /// Current hyperparameter option string (e.g. `"-I 50"`).
    fn options(&self) -> String;

    /// Apply a new hyperparameter option string, replacing any prior
    /// options. Does not affect whether the classifier has been trained.
    fn set_options(&mut self, options: &str) -> ModelResult<()>;

    /// Fit the classifier to `data`, replacing any previous fit.
    fn train(&mut self, data: &TrainingSet) -> ModelResult<()>;

    /// Probability of the positive ("yes") class for one feature row.
    /// Returns `ModelError::NotTrained` if called before `train`.
    fn predict_probability(&self, features: &[f64]) -> ModelResult<f64>;

    /// Predict the positive/negative label at a 0.5 threshold.
    fn predict(&self, features: &[f64]) -> ModelResult<bool> {
        Ok(self.predict_probability(features)? >= 0.5)
    }
}
