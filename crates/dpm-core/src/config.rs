//! Configuration surface for the defect-prediction mining pipeline.
//!
//! Mirrors the layered configuration pattern this crate is grounded on: a
//! `serde_yaml`-backed struct with named default constants, a `load_default`/
//! `from_path` pair, and a `validate()` that distinguishes hard errors (the
//! pipeline cannot run) from warnings (the value is unusual but usable).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DpmError, DpmResult};

/// Default fraction of releases (from the oldest) to include in extraction.
pub const DEFAULT_RELEASE_CUTOFF_PERCENTAGE: f64 = 0.5;
/// Default actionable-feature priority list.
pub const DEFAULT_ACTIONABLE_FEATURES: &str = "CodeSmells,CyclomaticComplexity";
/// Default number of features retained by the preprocessor.
pub const DEFAULT_FEATURES_TO_SELECT: usize = 5;
/// Default `low high step` triple for the k-NN hyperparameter sweep.
pub const DEFAULT_IBK_K_RANGE: &str = "1 10 1";
/// Default `low high step` triple for the random-forest iteration-count sweep.
pub const DEFAULT_RANDOMFOREST_ITERATIONS_RANGE: &str = "10 100 10";

/// `analysis.*` configuration section (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fraction of releases (from the oldest) to include, e.g. 0.5 = first half.
    pub release_cutoff_percentage: f64,
    /// Comma list of actionable feature names, in priority order.
    pub actionable_features: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            release_cutoff_percentage: DEFAULT_RELEASE_CUTOFF_PERCENTAGE,
            actionable_features: DEFAULT_ACTIONABLE_FEATURES.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// The actionable-feature list, in priority order.
    pub fn actionable_feature_list(&self) -> Vec<String> {
        self.actionable_features
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// `preprocessing.*` configuration section (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Number of top-ranked features to retain (k in the information-gain ranking).
    pub features_to_select: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            features_to_select: DEFAULT_FEATURES_TO_SELECT,
        }
    }
}

/// A `low high step` hyperparameter sweep range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    /// Inclusive lower bound.
    pub low: u32,
    /// Inclusive upper bound.
    pub high: u32,
    /// Step size.
    pub step: u32,
}

impl SweepRange {
    /// Parse a `"low high step"` string, as used by §6's `tuner.*.*_range` keys.
    pub fn parse(s: &str) -> DpmResult<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(DpmError::ConfigInvalid {
                message: format!("expected `low high step`, got `{s}`"),
            });
        }
        let parse_one = |p: &str| {
            p.parse::<u32>().map_err(|_| DpmError::ConfigInvalid {
                message: format!("`{p}` in `{s}` is not a non-negative integer"),
            })
        };
        Ok(Self {
            low: parse_one(parts[0])?,
            high: parse_one(parts[1])?,
            step: parse_one(parts[2])?,
        })
    }

    /// The values this range sweeps over, inclusive of `high`.
    pub fn values(&self) -> Vec<u32> {
        if self.step == 0 || self.low > self.high {
            return vec![self.low];
        }
        let mut v = Vec::new();
        let mut cur = self.low;
        while cur <= self.high {
            v.push(cur);
            cur += self.step;
        }
        if v.is_empty() {
            v.push(self.low);
        }
        v
    }
}

/// `tuner.ibk.*` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IbkTunerConfig {
    /// `low high step` for the k-NN neighbour count.
    pub k_range: String,
}

impl Default for IbkTunerConfig {
    fn default() -> Self {
        Self {
            k_range: DEFAULT_IBK_K_RANGE.to_string(),
        }
    }
}

/// `tuner.randomforest.*` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestTunerConfig {
    /// `low high step` for the ensemble-tree iteration count.
    pub iterations_range: String,
}

impl Default for RandomForestTunerConfig {
    fn default() -> Self {
        Self {
            iterations_range: DEFAULT_RANDOMFOREST_ITERATIONS_RANGE.to_string(),
        }
    }
}

/// `tuner.*` configuration section (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// k-NN tuning range.
    pub ibk: IbkTunerConfig,
    /// Ensemble-tree tuning range.
    pub randomforest: RandomForestTunerConfig,
}

/// Top-level configuration for a mining run.
///
/// Resolution precedence (highest to lowest), mirroring the CLI's own
/// precedence chain: CLI flag > environment variable > config file >
/// built-in default. This struct represents the config-file layer; the CLI
/// layers flags and environment variables on top of a loaded `GlobalConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Release-selection and actionable-feature settings.
    pub analysis: AnalysisConfig,
    /// Preprocessing pipeline settings.
    pub preprocessing: PreprocessingConfig,
    /// Classifier hyperparameter tuning settings.
    pub tuner: TunerConfig,
}

impl GlobalConfig {
    /// The default config file location, `~/.dpm/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dpm").join("config.yaml"))
    }

    /// Load the config at the default path, or built-in defaults if absent.
    pub fn load_default() -> DpmResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load a config from an explicit path.
    pub fn from_path(path: &Path) -> DpmResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| DpmError::InvalidConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// A config populated with built-in defaults, for tests.
    pub fn default_for_testing() -> Self {
        Self::default()
    }

    /// Validate this configuration.
    ///
    /// Returns `Ok(warnings)` for configurations the pipeline can still run
    /// with (warnings describe unusual-but-usable values) and `Err` only for
    /// configurations that make the pipeline impossible to run.
    pub fn validate(&self) -> DpmResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.preprocessing.features_to_select == 0 {
            return Err(DpmError::ConfigInvalid {
                message: "preprocessing.features_to_select must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.analysis.release_cutoff_percentage)
            || self.analysis.release_cutoff_percentage <= 0.0
        {
            warnings.push(format!(
                "analysis.release_cutoff_percentage = {} is outside (0.0, 1.0]; clamping to 1.0",
                self.analysis.release_cutoff_percentage
            ));
        }

        if self.analysis.actionable_feature_list().is_empty() {
            return Err(DpmError::ConfigInvalid {
                message: "analysis.actionable_features must name at least one feature".to_string(),
            });
        }

        // Hard-errors if the ranges themselves don't parse; a malformed
        // range makes tuning impossible to run meaningfully.
        SweepRange::parse(&self.tuner.ibk.k_range)?;
        SweepRange::parse(&self.tuner.randomforest.iterations_range)?;

        Ok(warnings)
    }

    /// The effective release cutoff, clamped into `(0.0, 1.0]`.
    pub fn effective_release_cutoff_percentage(&self) -> f64 {
        let p = self.analysis.release_cutoff_percentage;
        if p > 0.0 && p <= 1.0 {
            p
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = GlobalConfig::default();
        assert_eq!(cfg.analysis.release_cutoff_percentage, 0.5);
        assert_eq!(
            cfg.analysis.actionable_feature_list(),
            vec!["CodeSmells".to_string(), "CyclomaticComplexity".to_string()]
        );
        assert_eq!(cfg.preprocessing.features_to_select, 5);
        assert_eq!(cfg.tuner.ibk.k_range, "1 10 1");
        assert_eq!(cfg.tuner.randomforest.iterations_range, "10 100 10");
    }

    #[test]
    fn validate_rejects_zero_features_to_select() {
        let mut cfg = GlobalConfig::default();
        cfg.preprocessing.features_to_select = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_warns_on_out_of_range_cutoff() {
        let mut cfg = GlobalConfig::default();
        cfg.analysis.release_cutoff_percentage = 1.5;
        let warnings = cfg.validate().expect("should not be a hard error");
        assert_eq!(warnings.len(), 1);
        assert_eq!(cfg.effective_release_cutoff_percentage(), 1.0);
    }

    #[test]
    fn sweep_range_parses_and_enumerates() {
        let range = SweepRange::parse("1 10 1").unwrap();
        assert_eq!(range.values(), (1..=10).collect::<Vec<_>>());

        let range = SweepRange::parse("10 100 10").unwrap();
        assert_eq!(range.values().first(), Some(&10));
        assert_eq!(range.values().last(), Some(&100));
    }

    #[test]
    fn sweep_range_rejects_malformed_input() {
        assert!(SweepRange::parse("1 10").is_err());
        assert!(SweepRange::parse("a b c").is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let cfg = GlobalConfig::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: GlobalConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.preprocessing.features_to_select, cfg.preprocessing.features_to_select);
    }
}
