//! `feedlens dashboard`: the dashboard's panels rendered as text.

use crate::cli::{DashboardArgs, OutputFormat};
use crate::client::{endpoint, http_client, read_json};
use crate::models::{FilterInsights, FilterQuery, RankedCounts, Recommendations, SummaryResponse};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Width of the longest bar in a chart.
const BAR_WIDTH: usize = 30;

/// Everything one dashboard refresh fetches.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub kpis: FilterInsights,
    pub sentiment: RankedCounts,
    pub features: BTreeMap<String, BTreeMap<String, u64>>,
    pub competitors: RankedCounts,
    pub ratings: BTreeMap<String, f64>,
    pub recommendations: Recommendations,
    pub summary: String,
}

/// Run the dashboard command.
pub async fn run(args: &DashboardArgs, server_url: &str) -> Result<()> {
    let query = FilterQuery::new(args.vehicle.clone(), args.sentiment.clone());
    let snapshot = fetch(server_url, &query).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => println!("{}", render(&snapshot)),
    }

    Ok(())
}

async fn get<T: DeserializeOwned>(
    client: &reqwest::Client,
    server_url: &str,
    path: &str,
    query: &FilterQuery,
) -> Result<T> {
    let url = endpoint(server_url, path);
    debug!("GET {} {:?}", url, query);

    let response = client
        .get(&url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;
    read_json(response).await
}

/// Fetch every panel with the same filter.
pub async fn fetch(server_url: &str, query: &FilterQuery) -> Result<DashboardSnapshot> {
    let client = http_client()?;

    let (kpis, sentiment, features, competitors, ratings, recommendations, summary) = futures::try_join!(
        get::<FilterInsights>(&client, server_url, "filter", query),
        get::<RankedCounts>(&client, server_url, "sentiment", query),
        get::<BTreeMap<String, BTreeMap<String, u64>>>(&client, server_url, "features", query),
        get::<RankedCounts>(&client, server_url, "competitors", query),
        get::<BTreeMap<String, f64>>(&client, server_url, "ratings", query),
        get::<Recommendations>(&client, server_url, "recommendations", query),
        get::<SummaryResponse>(&client, server_url, "summary", query),
    )?;

    Ok(DashboardSnapshot {
        kpis,
        sentiment,
        features,
        competitors,
        ratings,
        recommendations,
        summary: summary.summary,
    })
}

/// KPI lines, one per dashboard tile.
pub fn render_kpis(kpis: &FilterInsights) -> String {
    let avg_rating = kpis
        .avg_rating
        .filter(|r| *r != 0.0)
        .map(|r| r.to_string())
        .unwrap_or_else(|| "--".to_string());

    format!(
        "Total Reviews: {}\nAvg Rating: {}\nPositive: {}%\nNegative: {}%\nSales Growth Potential: {}%",
        kpis.total_reviews, avg_rating, kpis.pos_percent, kpis.neg_percent, kpis.growth_potential
    )
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len)
}

fn chart<'a>(title: &str, rows: impl IntoIterator<Item = (&'a str, f64)>) -> String {
    let rows: Vec<(&str, f64)> = rows.into_iter().collect();
    let mut out = format!("{}\n", title);

    if rows.is_empty() {
        out.push_str("  (no data)");
        return out;
    }

    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0, f64::max);

    let lines: Vec<String> = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "  {:<width$}  {} {}",
                label,
                bar(*value, max),
                value,
                width = label_width
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

/// Ranked counts as a horizontal bar chart.
pub fn render_counts(title: &str, counts: &RankedCounts) -> String {
    if counts.is_empty() {
        return format!("{}\n  (no data)", title);
    }
    chart(title, counts.0.iter().map(|(l, c)| (l.as_str(), *c as f64)))
}

/// Positive and negative mentions per feature.
///
/// Features are the columns of the positive row; a pivot without one has
/// nothing to chart.
pub fn render_features(pivot: &BTreeMap<String, BTreeMap<String, u64>>) -> String {
    let mut out = "Feature Sentiment\n".to_string();

    let Some(positive) = pivot.get("Positive") else {
        out.push_str("  (no data)");
        return out;
    };
    let negative = pivot.get("Negative");

    let width = positive.keys().map(|f| f.chars().count()).max().unwrap_or(0);
    let lines: Vec<String> = positive
        .iter()
        .map(|(feature, pos)| {
            let neg = negative.and_then(|n| n.get(feature)).copied().unwrap_or(0);
            format!(
                "  {:<width$}  +{:<5} -{}",
                feature,
                pos,
                neg,
                width = width
            )
        })
        .collect();

    if lines.is_empty() {
        out.push_str("  (no data)");
    } else {
        out.push_str(&lines.join("\n"));
    }
    out
}

pub fn render_recommendations(recs: &Recommendations) -> String {
    let mut out = "Negative Issues\n".to_string();
    for rec in &recs.negative {
        out.push_str(&format!(
            "  ✗ {}: {}\n    {} | cost {} | {} | risk {} | priority {}\n",
            rec.issue,
            rec.suggestion,
            rec.time_duration,
            rec.cost,
            rec.impact,
            rec.risk,
            rec.priority_index
        ));
    }

    out.push_str("Positive Opportunities\n");
    for rec in &recs.positive {
        out.push_str(&format!(
            "  ✓ {}: {}\n    {} | cost {} | {} | priority {}\n",
            rec.opportunity,
            rec.suggestion,
            rec.time_duration,
            rec.cost,
            rec.impact,
            rec.priority_index
        ));
    }

    if !recs.summary.is_empty() {
        out.push_str(&recs.summary);
    }
    out.trim_end().to_string()
}

/// The whole dashboard as text.
pub fn render(snapshot: &DashboardSnapshot) -> String {
    let summary = if snapshot.summary.is_empty() {
        "No summary available."
    } else {
        snapshot.summary.as_str()
    };

    [
        render_kpis(&snapshot.kpis),
        render_counts("Sentiment", &snapshot.sentiment),
        render_features(&snapshot.features),
        render_counts("Competitor Mentions", &snapshot.competitors),
        chart(
            "Avg Rating by Vehicle",
            snapshot.ratings.iter().map(|(v, r)| (v.as_str(), *r)),
        ),
        render_recommendations(&snapshot.recommendations),
        format!("AI Summary\n  {}", summary),
    ]
    .join("\n\n")
}
