//! Actionable-feature picker (component 11, §4.11).

use crate::preprocess::rank_features;
use crate::types::Dataset;

/// Rank `dataset`'s features by information gain, walk the ranking
/// descending, and return the first name on `actionable_list`. Falls back
/// to `actionable_list`'s first entry if no ranked feature overlaps it.
pub fn pick_actionable_feature(dataset: &Dataset, actionable_list: &[String]) -> Option<String> {
    let ranking = rank_features(dataset);
    let picked = ranking
        .iter()
        .find(|r| actionable_list.iter().any(|name| name == &r.name))
        .map(|r| r.name.clone());
    picked.or_else(|| actionable_list.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset {
            columns: vec!["CodeSmells".to_string(), "Noise".to_string(), "class".to_string()],
            rows: vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 1.0],
                vec![1.0, 1.0, 1.0],
            ],
        }
    }

    #[test]
    fn picks_first_ranked_feature_on_the_actionable_list() {
        let list = vec!["CodeSmells".to_string(), "CyclomaticComplexity".to_string()];
        assert_eq!(pick_actionable_feature(&dataset(), &list), Some("CodeSmells".to_string()));
    }

    #[test]
    fn falls_back_to_first_configured_name_when_no_overlap() {
        let list = vec!["ParameterCount".to_string()];
        assert_eq!(pick_actionable_feature(&dataset(), &list), Some("ParameterCount".to_string()));
    }

    #[test]
    fn empty_list_and_dataset_yields_none() {
        assert_eq!(pick_actionable_feature(&dataset(), &[]), None);
    }
}
