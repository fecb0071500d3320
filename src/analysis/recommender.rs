//! Rule-based sales recommendations.
//!
//! Each rule inspects the filtered feedback and, when its threshold is
//! crossed, contributes an issue or an opportunity with a cost, impact and
//! time estimate. The estimates are folded into a single priority index.

use crate::analysis::insights::{apply_filters, value_counts};
use crate::loader::FeedbackTable;
use crate::models::{
    FilterQuery, IssueRecommendation, OpportunityRecommendation, Recommendations, Record,
};

/// A keyword must appear in more than this many rows for its rule to fire.
pub const MENTION_THRESHOLD: usize = 10;

/// Weighted priority from cost, impact and time labels.
///
/// Unknown labels score 2. An impact label such as `"High — long term"` is
/// scored on the part before the dash.
pub fn compute_priority(cost: &str, impact: &str, duration: &str) -> i64 {
    let cost_score = match cost {
        "Low" | "₹1 Cr" => 3,
        "₹2 Cr" | "₹5–7 Cr" => 2,
        "₹10 Cr" | "₹15–20 Cr" => 1,
        _ => 2,
    };

    let impact_key = impact.split('—').next().unwrap_or(impact);
    let impact_score = match impact_key {
        "Low" => 1,
        "Medium" => 2,
        "High" => 3,
        "Very High" => 4,
        _ => 2,
    };

    let time_score = match duration {
        "Immediate" => 5,
        "Ongoing" => 4,
        "3–6 months" => 3,
        "6–12 months" => 2,
        _ => 2,
    };

    impact_score * 2 + time_score - cost_score
}

fn mentions(rows: &[&Record], column: &str, keyword: &str) -> usize {
    rows.iter().filter(|r| r.contains_ci(column, keyword)).count()
}

fn issue(
    issue: impl Into<String>,
    suggestion: impl Into<String>,
    time_duration: &str,
    cost: &str,
    impact: &str,
    risk: &str,
) -> IssueRecommendation {
    IssueRecommendation {
        issue: issue.into(),
        suggestion: suggestion.into(),
        time_duration: time_duration.to_string(),
        cost: cost.to_string(),
        impact: impact.to_string(),
        risk: risk.to_string(),
        priority_index: compute_priority(cost, impact, time_duration),
    }
}

fn opportunity(
    opportunity: &str,
    suggestion: &str,
    time_duration: &str,
    cost: &str,
    impact: &str,
) -> OpportunityRecommendation {
    OpportunityRecommendation {
        opportunity: opportunity.to_string(),
        suggestion: suggestion.to_string(),
        time_duration: time_duration.to_string(),
        cost: cost.to_string(),
        impact: impact.to_string(),
        priority_index: compute_priority(cost, impact, time_duration),
    }
}

/// Generate actionable recommendations for the filtered feedback.
pub fn generate_recommendations(table: &FeedbackTable, query: &FilterQuery) -> Recommendations {
    let mut recs = Recommendations::default();

    if table.is_empty() {
        recs.negative.push(IssueRecommendation {
            issue: "Dataset not loaded".to_string(),
            suggestion: "Upload the latest Tata Motors sentiment dataset.".to_string(),
            time_duration: "Immediate".to_string(),
            cost: "N/A".to_string(),
            impact: "N/A".to_string(),
            risk: "System dependency".to_string(),
            priority_index: 0,
        });
        recs.summary = "⚠️ No dataset available to generate recommendations.".to_string();
        return recs;
    }

    let rows = apply_filters(table, query);

    if mentions(&rows, "pain_point", "service") > MENTION_THRESHOLD {
        recs.negative.push(issue(
            "Service Delays / Quality Complaints",
            "Expand Tier-2 city service centers & digitize booking slots.",
            "6–12 months",
            "₹15–20 Cr",
            "High",
            "Hiring bottlenecks, supply chain constraints",
        ));
    }

    if mentions(&rows, "pain_point", "price") > MENTION_THRESHOLD {
        recs.negative.push(issue(
            "High Price Perception",
            "Introduce festive offers and flexible financing (EMIs or exchange bonus).",
            "3–6 months",
            "₹5–7 Cr",
            "High",
            "Short-term margin compression",
        ));
    }

    if mentions(&rows, "pain_point", "mileage") > MENTION_THRESHOLD {
        recs.negative.push(issue(
            "Mileage-related Negative Feedback",
            "Run public mileage challenge campaigns; improve engine optimization.",
            "4–8 months",
            "₹3–5 Cr",
            "Medium",
            "Dependent on R&D execution speed",
        ));
    }

    if let Some(top) = value_counts(&rows, "competitor").first() {
        recs.negative.push(issue(
            format!("Competition from {}", top),
            format!(
                "Highlight Tata’s safety & build quality advantages over {}.",
                top
            ),
            "2–3 months",
            "₹2 Cr",
            "Medium",
            "Ad-fatigue or counter-campaign from rival",
        ));
    }

    if mentions(&rows, "feature", "comfort") > MENTION_THRESHOLD {
        recs.positive.push(opportunity(
            "Comfort & Space Perception",
            "Position Safari as the ultimate family SUV for long-distance trips.",
            "Ongoing",
            "₹1 Cr",
            "High",
        ));
    }

    if mentions(&rows, "vehicle", "Nexon EV") > MENTION_THRESHOLD {
        recs.positive.push(opportunity(
            "EV Adoption Trend",
            "Promote Nexon EV with government subsidy awareness & charging-infra tie-ups.",
            "6 months",
            "₹10 Cr",
            "Very High",
        ));
    }

    if recs.negative.is_empty() && recs.positive.is_empty() {
        recs.positive.push(opportunity(
            "Stable Customer Sentiment",
            "Continue monitoring sentiment trends and competitor dynamics monthly.",
            "Ongoing",
            "Minimal",
            "Low",
        ));
    }

    recs.summary = format!(
        "📊 {} growth opportunities and {} critical issues detected. \
         Tata should focus on service expansion and EV momentum for maximum ROI.",
        recs.positive.len(),
        recs.negative.len()
    );

    recs
}
