//! Per-kind hyperparameter options and their WEKA-style option-string codec.
//!
//! Every classifier kind accepts and emits a single option string (mirroring
//! the original system's `setOptions`/`getOptions` contract) so the tuner and
//! the persisted model blob can carry a kind-agnostic `String` rather than a
//! typed config enum.

use crate::error::{ModelError, ModelResult};

/// Ensemble tree: number of boosting/bagging iterations (trees grown).
pub const DEFAULT_TREE_ITERATIONS: usize = 50;
/// k-NN: number of neighbours consulted.
pub const DEFAULT_KNN_K: usize = 5;

/// `"-I <n>"` — ensemble tree iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    pub iterations: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_TREE_ITERATIONS,
        }
    }
}

impl TreeOptions {
    pub fn to_option_string(&self) -> String {
        format!("-I {}", self.iterations)
    }

    pub fn from_option_string(s: &str) -> ModelResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        parse_flag(s, "-I")
            .map(|iterations| Self { iterations })
            .ok_or_else(|| ModelError::invalid_options("tree", s, "expected `-I <iterations>`"))
    }
}

/// `"-K <n>"` — nearest-neighbour count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnOptions {
    pub k: usize,
}

impl Default for KnnOptions {
    fn default() -> Self {
        Self { k: DEFAULT_KNN_K }
    }
}

impl KnnOptions {
    pub fn to_option_string(&self) -> String {
        format!("-K {}", self.k)
    }

    pub fn from_option_string(s: &str) -> ModelResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        parse_flag(s, "-K")
            .map(|k| Self { k })
            .ok_or_else(|| ModelError::invalid_options("knn", s, "expected `-K <neighbours>`"))
    }
}

/// Naive Bayes has no tunable hyperparameter (§4.10); its option string is
/// always empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BayesOptions;

impl BayesOptions {
    pub fn to_option_string(&self) -> String {
        String::new()
    }

    pub fn from_option_string(_s: &str) -> ModelResult<Self> {
        Ok(Self)
    }
}

fn parse_flag(s: &str, flag: &str) -> Option<usize> {
    let mut tokens = s.split_whitespace();
    while let Some(tok) = tokens.next() {
        if tok == flag {
            return tokens.next()?.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_options_round_trip() {
        let opts = TreeOptions { iterations: 80 };
        let rendered = opts.to_option_string();
        assert_eq!(TreeOptions::from_option_string(&rendered).unwrap(), opts);
    }

    #[test]
    fn knn_options_defaults_on_blank_string() {
        assert_eq!(KnnOptions::from_option_string("").unwrap(), KnnOptions::default());
    }

    #[test]
    fn malformed_option_string_is_rejected() {
        assert!(TreeOptions::from_option_string("-X 5").is_err());
    }
}
