//! Route handlers.

use crate::analysis::{analyze_negative_sentiment, insights, recommender};
use crate::error::AnalyzeError;
use crate::models::{AnalyzeResponse, FilterQuery, SummaryResponse};
use crate::server::upload::receive_csv;
use crate::server::AppState;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use tracing::info;

/// Upload a CSV, aggregate its negative feedback and ask for a strategy.
#[post("/analyze")]
pub async fn analyze(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AnalyzeError> {
    let upload = receive_csv(payload, &state.uploads).await?;
    let table = state.loader.load_path(upload.path()).await?;

    let analysis = analyze_negative_sentiment(&table.records);
    info!(
        "Analyzed {} rows from {} ({} bytes): {} negative, estimated cost {}",
        table.len(),
        upload.original_name().unwrap_or("upload"),
        upload.size(),
        analysis.total_negative,
        analysis.cost_estimate
    );

    let ai_strategy = state.strategist.suggest(&analysis).await?;

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        analysis,
        ai_strategy,
    }))
}

#[get("/sentiment")]
pub async fn sentiment(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    HttpResponse::Ok().json(insights::sentiment_overview(&state.dataset, &query))
}

#[get("/features")]
pub async fn features(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    HttpResponse::Ok().json(insights::feature_sentiment(&state.dataset, &query))
}

#[get("/competitors")]
pub async fn competitors(
    state: web::Data<AppState>,
    query: web::Query<FilterQuery>,
) -> HttpResponse {
    HttpResponse::Ok().json(insights::competitor_analysis(&state.dataset, &query))
}

#[get("/painpoints")]
pub async fn painpoints(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    HttpResponse::Ok().json(insights::painpoints(&state.dataset, &query))
}

#[get("/ratings")]
pub async fn ratings(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    HttpResponse::Ok().json(insights::ratings_by_vehicle(&state.dataset, &query))
}

#[get("/filter")]
pub async fn filter(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    HttpResponse::Ok().json(insights::filter_insights(&state.dataset, &query))
}

#[get("/recommendations")]
pub async fn recommendations(
    state: web::Data<AppState>,
    query: web::Query<FilterQuery>,
) -> HttpResponse {
    HttpResponse::Ok().json(recommender::generate_recommendations(&state.dataset, &query))
}

#[get("/summary")]
pub async fn summary(state: web::Data<AppState>, query: web::Query<FilterQuery>) -> HttpResponse {
    let kpis = insights::filter_insights(&state.dataset, &query);
    HttpResponse::Ok().json(SummaryResponse {
        summary: insights::summary_text(&kpis),
    })
}
