//! Read-side rollups behind the dashboard routes.
//!
//! Every function takes the shared dataset plus the request's
//! [`FilterQuery`] and returns the JSON shape its route serves.

use crate::loader::FeedbackTable;
use crate::models::{FilterInsights, FilterQuery, RankedCounts, Record};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maximum entries returned by the competitor and pain point rankings.
pub const TOP_MENTIONS: usize = 10;

/// Maximum entries in the KPI block's top lists.
pub const TOP_INSIGHTS: usize = 5;

/// Apply the vehicle and sentiment filters.
///
/// Filters are case-insensitive substring matches. A filter on a column the
/// dataset does not have is ignored.
pub fn apply_filters<'a>(table: &'a FeedbackTable, query: &FilterQuery) -> Vec<&'a Record> {
    let vehicle = query.vehicle().filter(|_| table.has_column("vehicle"));
    let sentiment = query.sentiment().filter(|_| table.has_column("sentiment"));

    table
        .records
        .iter()
        .filter(|r| vehicle.map_or(true, |v| r.contains_ci("vehicle", v)))
        .filter(|r| sentiment.map_or(true, |s| r.contains_ci("sentiment", s)))
        .collect()
}

/// Count the non-empty values of `column`, most frequent first.
///
/// Ties keep the order in which values first appear.
pub fn value_counts(rows: &[&Record], column: &str) -> RankedCounts {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for value in rows.iter().filter_map(|r| r.get(column)) {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    RankedCounts(counts)
}

fn top_values(rows: &[&Record], column: &str, n: usize) -> RankedCounts {
    let mut ranked = value_counts(rows, column);
    ranked.0.truncate(n);
    ranked
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn rating(record: &Record) -> Option<f64> {
    record
        .get("rating")
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite())
}

/// Sentiment label distribution.
pub fn sentiment_overview(table: &FeedbackTable, query: &FilterQuery) -> RankedCounts {
    let rows = apply_filters(table, query);
    value_counts(&rows, "sentiment")
}

/// Feature counts pivoted by feature sentiment.
///
/// Shape: `{feature_sentiment: {feature: count}}`, zero-filled so every
/// sentiment lists every feature.
pub fn feature_sentiment(
    table: &FeedbackTable,
    query: &FilterQuery,
) -> BTreeMap<String, BTreeMap<String, u64>> {
    if !table.has_column("feature") || !table.has_column("feature_sentiment") {
        return BTreeMap::new();
    }

    let rows = apply_filters(table, query);
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .filter_map(|r| Some((r.get("feature")?, r.get("feature_sentiment")?)))
        .collect();

    let features: BTreeSet<&str> = pairs.iter().map(|(f, _)| *f).collect();
    let mut pivot: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for (_, sentiment) in &pairs {
        pivot.entry(sentiment.to_string()).or_insert_with(|| {
            features.iter().map(|f| (f.to_string(), 0)).collect()
        });
    }

    for (feature, sentiment) in pairs {
        if let Some(count) = pivot
            .get_mut(sentiment)
            .and_then(|by_feature| by_feature.get_mut(feature))
        {
            *count += 1;
        }
    }

    pivot
}

/// Most mentioned competitors.
pub fn competitor_analysis(table: &FeedbackTable, query: &FilterQuery) -> RankedCounts {
    if !table.has_column("competitor") {
        return RankedCounts::default();
    }
    let rows = apply_filters(table, query);
    top_values(&rows, "competitor", TOP_MENTIONS)
}

/// Most frequent pain points.
pub fn painpoints(table: &FeedbackTable, query: &FilterQuery) -> RankedCounts {
    if !table.has_column("pain_point") {
        return RankedCounts::default();
    }
    let rows = apply_filters(table, query);
    top_values(&rows, "pain_point", TOP_MENTIONS)
}

/// Mean rating per vehicle, rounded to two decimals.
///
/// Non-numeric ratings are ignored; vehicles without any numeric rating
/// are left out.
pub fn ratings_by_vehicle(table: &FeedbackTable, query: &FilterQuery) -> BTreeMap<String, f64> {
    if !table.has_column("vehicle") || !table.has_column("rating") {
        return BTreeMap::new();
    }

    let rows = apply_filters(table, query);
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for record in &rows {
        if let (Some(vehicle), Some(value)) = (record.get("vehicle"), rating(record)) {
            let entry = totals.entry(vehicle).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(vehicle, (sum, count))| (vehicle.to_string(), round2(sum / count as f64)))
        .collect()
}

/// KPI block for the dashboard header.
pub fn filter_insights(table: &FeedbackTable, query: &FilterQuery) -> FilterInsights {
    let rows = apply_filters(table, query);
    if rows.is_empty() {
        return FilterInsights::empty();
    }

    let total = rows.len();
    let pos = rows.iter().filter(|r| r.contains_ci("sentiment", "pos")).count();
    let neg = rows.iter().filter(|r| r.contains_ci("sentiment", "neg")).count();
    let percent = |n: f64| round2(n / total as f64 * 100.0);

    let avg_rating = if table.has_column("rating") {
        mean(rows.iter().filter_map(|r| rating(r))).map(round2)
    } else {
        None
    };

    let dominant_sentiment = if table.has_column("sentiment") {
        value_counts(&rows, "sentiment").first().map(str::to_string)
    } else {
        None
    };

    let top_features = if table.has_column("feature") {
        top_values(&rows, "feature", TOP_INSIGHTS)
    } else {
        RankedCounts::default()
    };

    let common_painpoints = if table.has_column("pain_point") {
        top_values(&rows, "pain_point", TOP_INSIGHTS)
    } else {
        RankedCounts::default()
    };

    FilterInsights {
        total_reviews: total,
        avg_rating,
        pos_percent: percent(pos as f64),
        neg_percent: percent(neg as f64),
        growth_potential: percent(pos as f64 - neg as f64),
        dominant_sentiment,
        top_features: Some(top_features),
        common_painpoints: Some(common_painpoints),
    }
}

/// One-paragraph narrative of the KPI block.
///
/// Rates and ratings keep a decimal point (`4.0`, `100.0%`). An empty
/// selection reports `0%`, no rating as `None` and no dominant sentiment
/// as `N/A`.
pub fn summary_text(insights: &FilterInsights) -> String {
    let empty = insights.total_reviews == 0;
    let percent = |p: f64| {
        if empty {
            "0".to_string()
        } else {
            format!("{:?}", p)
        }
    };
    let dominant = match insights.dominant_sentiment.as_deref() {
        Some(sentiment) => sentiment,
        None if empty => "N/A",
        None => "None",
    };

    let join = |ranked: &Option<RankedCounts>| {
        let labels: Vec<&str> = ranked.iter().flat_map(|r| r.labels()).collect();
        if labels.is_empty() {
            "None".to_string()
        } else {
            labels.join(", ")
        }
    };

    format!(
        "Analyzed {} posts. Dominant sentiment: {}. Avg rating: {}. \
         Positive sentiment: {}%, Negative sentiment: {}%. \
         Top features: {}. Main pain points: {}.",
        insights.total_reviews,
        dominant,
        insights
            .avg_rating
            .map(|r| format!("{:?}", r))
            .unwrap_or_else(|| "None".to_string()),
        percent(insights.pos_percent),
        percent(insights.neg_percent),
        join(&insights.top_features),
        join(&insights.common_painpoints),
    )
}
