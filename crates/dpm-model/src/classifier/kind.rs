//! The classifier-kind tag and its factory (Design Note 9: "dynamic
//! reflection becomes an explicit classifier factory by kind").

use serde::{Deserialize, Serialize};

use crate::classifier::bayes::NaiveBayesClassifier;
use crate::classifier::knn::KnnClassifier;
use crate::classifier::tree::EnsembleTreeClassifier;
use crate::classifier::Classifier;
use crate::config::{BayesOptions, KnnOptions, TreeOptions};

/// Tag identifying one of the three concrete classifier implementations.
/// Fixed tie-break order for the orchestrator (§4.10): tree, bayes, knn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Tree,
    Bayes,
    Knn,
}

impl ClassifierKind {
    /// All kinds in the fixed tie-break order used by the orchestrator.
    pub const ALL: [ClassifierKind; 3] = [ClassifierKind::Tree, ClassifierKind::Bayes, ClassifierKind::Knn];

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::Tree => "tree",
            ClassifierKind::Bayes => "bayes",
            ClassifierKind::Knn => "knn",
        }
    }

    /// Build a freshly constructed, untrained classifier of this kind.
    pub fn build(&self) -> Box<dyn Classifier> {
        match self {
            ClassifierKind::Tree => Box::new(EnsembleTreeClassifier::new()),
            ClassifierKind::Bayes => Box::new(NaiveBayesClassifier::new()),
            ClassifierKind::Knn => Box::new(KnnClassifier::new()),
        }
    }

    /// This kind's default option string.
    pub fn default_options(&self) -> String {
        match self {
            ClassifierKind::Tree => TreeOptions::default().to_option_string(),
            ClassifierKind::Bayes => BayesOptions::default().to_option_string(),
            ClassifierKind::Knn => KnnOptions::default().to_option_string(),
        }
    }

    /// Whether this kind has a hyperparameter worth nested-CV tuning
    /// (§4.10: "bayes: none").
    pub fn is_tunable(&self) -> bool {
        !matches!(self, ClassifierKind::Bayes)
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build a trained classifier of `kind` with `options` applied.
pub fn build_with_options(
    kind: ClassifierKind,
    options: &str,
) -> crate::error::ModelResult<Box<dyn Classifier>> {
    let mut clf = kind.build();
    clf.set_options(options)?;
    Ok(clf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_build_with_their_own_defaults() {
        for kind in ClassifierKind::ALL {
            let clf = build_with_options(kind, &kind.default_options()).unwrap();
            assert_eq!(clf.kind(), kind);
        }
    }

    #[test]
    fn only_bayes_is_non_tunable() {
        assert!(!ClassifierKind::Bayes.is_tunable());
        assert!(ClassifierKind::Tree.is_tunable());
        assert!(ClassifierKind::Knn.is_tunable());
    }
}
