//! Data models for the feedback dashboard.
//!
//! This module contains the records parsed from feedback CSVs and the
//! JSON shapes exchanged between the server and its clients.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One feedback row: column name to cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the cell for `column`, or `None` when the column is absent
    /// or the cell is empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Case-insensitive substring match on a cell. Missing cells never match.
    pub fn contains_ci(&self, column: &str, needle: &str) -> bool {
        self.get(column)
            .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Aggregate of the negative feedback in one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeAnalysis {
    /// Number of rows whose sentiment is "negative".
    pub total_negative: u64,
    /// Negative rows per feature.
    pub feature_breakdown: BTreeMap<String, u64>,
    /// Estimated cost per feature.
    pub cost_by_feature: BTreeMap<String, u64>,
    /// Estimated cost across all negative rows.
    pub cost_estimate: u64,
}

/// Successful response of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: NegativeAnalysis,
    pub ai_strategy: String,
}

/// Error envelope returned on any request failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Optional `?vehicle=&sentiment=` filter of the read-side routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

impl FilterQuery {
    pub fn new(vehicle: Option<String>, sentiment: Option<String>) -> Self {
        Self { vehicle, sentiment }
    }

    /// The vehicle filter, ignoring empty values.
    pub fn vehicle(&self) -> Option<&str> {
        self.vehicle.as_deref().filter(|v| !v.is_empty())
    }

    /// The sentiment filter, ignoring empty values.
    pub fn sentiment(&self) -> Option<&str> {
        self.sentiment.as_deref().filter(|v| !v.is_empty())
    }
}

/// Counts ordered by rank (most frequent first).
///
/// Serialized as a JSON object whose key order is the rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCounts(pub Vec<(String, u64)>);

impl RankedCounts {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Labels in rank order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(label, _)| label.as_str())
    }

    /// Count for `label`, if present.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    /// The top-ranked label.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(|(label, _)| label.as_str())
    }
}

impl Serialize for RankedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RankedCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RankedVisitor;

        impl<'de> Visitor<'de> for RankedVisitor {
            type Value = RankedCounts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of label to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    entries.push((label, count));
                }
                Ok(RankedCounts(entries))
            }
        }

        deserializer.deserialize_map(RankedVisitor)
    }
}

/// KPI block served by `/filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterInsights {
    pub total_reviews: usize,
    pub avg_rating: Option<f64>,
    pub pos_percent: f64,
    pub neg_percent: f64,
    pub growth_potential: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_features: Option<RankedCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_painpoints: Option<RankedCounts>,
}

impl FilterInsights {
    /// Insights for a filter that matched nothing.
    pub fn empty() -> Self {
        Self {
            total_reviews: 0,
            avg_rating: None,
            pos_percent: 0.0,
            neg_percent: 0.0,
            growth_potential: 0.0,
            dominant_sentiment: None,
            top_features: None,
            common_painpoints: None,
        }
    }
}

/// Body of `/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// A problem area surfaced by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecommendation {
    pub issue: String,
    pub suggestion: String,
    pub time_duration: String,
    pub cost: String,
    pub impact: String,
    pub risk: String,
    pub priority_index: i64,
}

/// A growth opportunity surfaced by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecommendation {
    pub opportunity: String,
    pub suggestion: String,
    pub time_duration: String,
    pub cost: String,
    pub impact: String,
    pub priority_index: i64,
}

/// Body of `/recommendations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(rename = "Negative")]
    pub negative: Vec<IssueRecommendation>,
    #[serde(rename = "Positive")]
    pub positive: Vec<OpportunityRecommendation>,
    #[serde(rename = "Summary")]
    pub summary: String,
}
