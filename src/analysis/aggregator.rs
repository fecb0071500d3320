//! Negative feedback aggregation and cost estimation.
//!
//! This module turns the rows of an uploaded file into the
//! [`NegativeAnalysis`] that is shown to the user and sent to the
//! strategy provider.

use crate::models::{NegativeAnalysis, Record};
use std::collections::BTreeMap;

/// Estimated cost of handling one negative piece of feedback.
pub const COST_PER_ISSUE: u64 = 5000;

/// Feature bucket for rows without a feature.
pub const UNKNOWN_FEATURE: &str = "unknown";

/// Whether a row's sentiment is exactly "negative", ignoring case.
///
/// Rows without a sentiment never match.
pub fn is_negative(record: &Record) -> bool {
    record
        .get("sentiment")
        .map(|s| s.to_lowercase() == "negative")
        .unwrap_or(false)
}

/// Count negative rows per feature.
///
/// Missing, empty and whitespace-only features count as "unknown"; other
/// feature values are used verbatim.
pub fn negative_feature_counts(records: &[Record]) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    for record in records.iter().filter(|r| is_negative(r)) {
        let feature = record
            .get("feature")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(UNKNOWN_FEATURE);
        *counts.entry(feature.to_string()).or_default() += 1;
    }

    counts
}

/// Aggregate the negative feedback in `records`.
pub fn analyze_negative_sentiment(records: &[Record]) -> NegativeAnalysis {
    let feature_breakdown = negative_feature_counts(records);
    let total_negative: u64 = feature_breakdown.values().sum();

    let cost_by_feature = feature_breakdown
        .iter()
        .map(|(feature, count)| (feature.clone(), count * COST_PER_ISSUE))
        .collect();

    NegativeAnalysis {
        total_negative,
        feature_breakdown,
        cost_by_feature,
        cost_estimate: total_negative * COST_PER_ISSUE,
    }
}

/// Features ordered by negative count (highest first, then by name).
pub fn costliest_features(analysis: &NegativeAnalysis, n: usize) -> Vec<(&str, u64)> {
    let mut features: Vec<(&str, u64)> = analysis
        .cost_by_feature
        .iter()
        .map(|(feature, cost)| (feature.as_str(), *cost))
        .collect();

    features.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    features.truncate(n);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::CsvLoader;

    fn analyze_csv(csv: &str) -> NegativeAnalysis {
        analyze_negative_sentiment(&CsvLoader::new().parse_str(csv).unwrap().records)
    }

    fn row(sentiment: Option<&str>, feature: Option<&str>) -> Record {
        let mut pairs = Vec::new();
        if let Some(s) = sentiment {
            pairs.push(("sentiment", s));
        }
        if let Some(f) = feature {
            pairs.push(("feature", f));
        }
        Record::from_pairs(pairs)
    }

    #[test]
    fn test_reference_example() {
        let records = vec![
            row(Some("Negative"), Some("battery")),
            row(Some("positive"), Some("battery")),
            row(Some("NEGATIVE"), Some("")),
        ];

        let analysis = analyze_negative_sentiment(&records);

        assert_eq!(analysis.total_negative, 2);
        assert_eq!(analysis.feature_breakdown.get("battery"), Some(&1));
        assert_eq!(analysis.feature_breakdown.get("unknown"), Some(&1));
        assert_eq!(analysis.cost_by_feature.get("battery"), Some(&5000));
        assert_eq!(analysis.cost_by_feature.get("unknown"), Some(&5000));
        assert_eq!(analysis.cost_estimate, 10000);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let analysis = analyze_negative_sentiment(&[]);
        assert_eq!(analysis, NegativeAnalysis::default());
    }

    #[test]
    fn test_missing_sentiment_is_excluded() {
        let records = vec![
            row(None, Some("battery")),
            row(Some(""), Some("battery")),
            row(Some("negative"), Some("brakes")),
        ];

        let analysis = analyze_negative_sentiment(&records);
        assert_eq!(analysis.total_negative, 1);
        assert!(!analysis.feature_breakdown.contains_key("battery"));
    }

    #[test]
    fn test_only_exact_negative_matches() {
        let records = vec![
            row(Some("very negative"), Some("seats")),
            row(Some("neg"), Some("seats")),
            row(Some("NeGaTiVe"), Some("seats")),
        ];

        let analysis = analyze_negative_sentiment(&records);
        assert_eq!(analysis.total_negative, 1);
    }

    #[test]
    fn test_missing_feature_column_counts_as_unknown() {
        let records = vec![row(Some("negative"), None), row(Some("negative"), None)];

        let analysis = analyze_negative_sentiment(&records);
        assert_eq!(analysis.feature_breakdown.get(UNKNOWN_FEATURE), Some(&2));
    }

    #[test]
    fn test_breakdown_and_costs_are_consistent() {
        let records = vec![
            row(Some("negative"), Some("mileage")),
            row(Some("negative"), Some("mileage")),
            row(Some("negative"), Some("service")),
            row(Some("neutral"), Some("service")),
            row(Some("negative"), None),
        ];

        let analysis = analyze_negative_sentiment(&records);

        let sum: u64 = analysis.feature_breakdown.values().sum();
        assert_eq!(sum, analysis.total_negative);
        assert_eq!(analysis.cost_estimate, analysis.total_negative * COST_PER_ISSUE);
        for (feature, count) in &analysis.feature_breakdown {
            assert_eq!(analysis.cost_by_feature[feature], count * COST_PER_ISSUE);
        }
    }

    #[test]
    fn test_costliest_features() {
        let records = vec![
            row(Some("negative"), Some("service")),
            row(Some("negative"), Some("mileage")),
            row(Some("negative"), Some("mileage")),
            row(Some("negative"), Some("brakes")),
        ];

        let analysis = analyze_negative_sentiment(&records);
        let top = costliest_features(&analysis, 2);

        assert_eq!(top, vec![("mileage", 10000), ("brakes", 5000)]);
    }

    #[test]
    fn test_padded_cells_are_not_normalized() {
        let analysis = analyze_csv("sentiment,feature\n negative ,battery\nNegative, battery\n");

        assert_eq!(analysis.total_negative, 1);
        assert_eq!(analysis.feature_breakdown.len(), 1);
        assert_eq!(analysis.feature_breakdown.get(" battery"), Some(&1));
        assert!(!analysis.feature_breakdown.contains_key("battery"));
    }

    #[test]
    fn test_whitespace_feature_counts_as_unknown() {
        let analysis = analyze_csv("sentiment,feature\nnegative,   \nnegative,\"\t\"\n");

        assert_eq!(analysis.total_negative, 2);
        assert_eq!(analysis.feature_breakdown.get(UNKNOWN_FEATURE), Some(&2));
        assert_eq!(analysis.cost_estimate, 10000);
    }

    #[test]
    fn test_file_without_sentiment_column_is_all_zero() {
        let analysis = analyze_csv("feature,rating\nbattery,1\nnegative,2\n");
        assert_eq!(analysis, NegativeAnalysis::default());
    }

    #[test]
    fn test_duplicated_sentiment_header_uses_first_column() {
        let analysis =
            analyze_csv("sentiment,feature,sentiment\nnegative,battery,positive\npositive,seats,negative\n");

        assert_eq!(analysis.total_negative, 1);
        assert_eq!(analysis.feature_breakdown.get("battery"), Some(&1));
    }
}
