//! `feedlens upload`: submit a CSV and print the exchange as a conversation.

use crate::analysis::{analyze_negative_sentiment, costliest_features};
use crate::cli::{OutputFormat, UploadArgs};
use crate::client::{endpoint, format_amount, http_client, read_json};
use crate::loader::CsvLoader;
use crate::models::{AnalyzeResponse, NegativeAnalysis};
use crate::server::upload::UPLOAD_FIELD;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Features listed in the analyst's reply.
const FEATURES_SHOWN: usize = 5;

/// Run the upload command.
pub async fn run(
    args: &UploadArgs,
    server_url: &str,
    loader: &CsvLoader,
    show_progress: bool,
) -> Result<()> {
    if args.dry_run {
        return dry_run(args, loader).await;
    }

    let client = http_client()?;
    let response = submit(&client, server_url, &args.file, show_progress).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => {
            println!(
                "{}",
                render_transcript(&display_name(&args.file), &response, Local::now())
            );
        }
    }

    Ok(())
}

/// Aggregate locally; no server or strategy call.
async fn dry_run(args: &UploadArgs, loader: &CsvLoader) -> Result<()> {
    let table = loader
        .load_path(&args.file)
        .await
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let analysis = analyze_negative_sentiment(&table.records);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => {
            println!("🔍 Dry run: {} rows read from {}\n", table.len(), args.file.display());
            println!("{}", render_analysis(&analysis));
            println!("\n✅ Dry run complete. No server or LLM calls were made.");
        }
    }

    Ok(())
}

/// POST `file` to `/analyze` as the `csvFile` field.
pub async fn submit(
    client: &reqwest::Client,
    server_url: &str,
    file: &Path,
    show_progress: bool,
) -> Result<AnalyzeResponse> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    debug!("Uploading {} ({} bytes)", file.display(), bytes.len());

    let part = Part::bytes(bytes)
        .file_name(display_name(file))
        .mime_str("text/csv")?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    let url = endpoint(server_url, "analyze");
    info!("Submitting {} to {}", file.display(), url);

    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Analyzing feedback and waiting for strategy...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let result = client.post(&url).multipart(form).send().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let response = result.with_context(|| format!("Failed to reach {}", url))?;
    read_json(response).await
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string())
}

/// Plain-text account of an aggregate.
pub fn render_analysis(analysis: &NegativeAnalysis) -> String {
    if analysis.total_negative == 0 {
        return "No negative feedback found.".to_string();
    }

    let mut out = format!(
        "Found {} negative reviews with an estimated cost of {}.",
        analysis.total_negative,
        format_amount(analysis.cost_estimate)
    );

    let top = costliest_features(analysis, FEATURES_SHOWN);
    for (feature, cost) in &top {
        let count = analysis.feature_breakdown.get(*feature).copied().unwrap_or(0);
        out.push_str(&format!(
            "\n   • {}: {} reviews ({})",
            feature,
            count,
            format_amount(*cost)
        ));
    }

    let hidden = analysis.cost_by_feature.len().saturating_sub(top.len());
    if hidden > 0 {
        out.push_str(&format!("\n   … and {} more", hidden));
    }

    out
}

/// The upload as a three-turn conversation.
pub fn render_transcript(file_name: &str, response: &AnalyzeResponse, at: DateTime<Local>) -> String {
    let stamp = at.format("%H:%M:%S");
    format!(
        "[{stamp}] 🙋 You: Uploaded {file_name}\n\n\
         [{stamp}] 📊 Analyst: {analysis}\n\n\
         [{stamp}] 🤖 Strategist:\n{strategy}",
        analysis = render_analysis(&response.analysis),
        strategy = response.ai_strategy.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use crate::loader::FeedbackTable;
    use crate::server::{configure, AppState, UploadSettings};
    use crate::strategy::Strategist;
    use actix_web::{web, App, HttpServer};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample() -> NegativeAnalysis {
        analyze_negative_sentiment(
            &CsvLoader::new()
                .parse_str("sentiment,feature\nNegative,battery\nnegative,battery\nNEGATIVE,\n")
                .unwrap()
                .records,
        )
    }

    #[test]
    fn test_render_analysis_lists_costliest_first() {
        let text = render_analysis(&sample());
        assert!(text.starts_with("Found 3 negative reviews with an estimated cost of 15,000."));

        let battery = text.find("battery: 2 reviews (10,000)").unwrap();
        let unknown = text.find("unknown: 1 reviews (5,000)").unwrap();
        assert!(battery < unknown);
        assert!(!text.contains("more"));
    }

    #[test]
    fn test_render_analysis_truncates_features() {
        let csv = "sentiment,feature\n".to_string()
            + &["a", "b", "c", "d", "e", "f", "g"]
                .iter()
                .map(|f| format!("negative,{}\n", f))
                .collect::<String>();
        let analysis =
            analyze_negative_sentiment(&CsvLoader::new().parse_str(&csv).unwrap().records);

        let text = render_analysis(&analysis);
        assert_eq!(text.matches('•').count(), FEATURES_SHOWN);
        assert!(text.ends_with("… and 2 more"));
    }

    #[test]
    fn test_render_analysis_empty() {
        assert_eq!(
            render_analysis(&NegativeAnalysis::default()),
            "No negative feedback found."
        );
    }

    #[test]
    fn test_render_transcript() {
        let response = AnalyzeResponse {
            analysis: sample(),
            ai_strategy: "1. Improve battery life\n2. Run a service campaign\n".to_string(),
        };
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();

        let text = render_transcript("feedback.csv", &response, at);
        assert!(text.starts_with("[09:30:00] 🙋 You: Uploaded feedback.csv"));
        assert!(text.contains("[09:30:00] 📊 Analyst: Found 3 negative reviews"));
        assert!(text.ends_with("🤖 Strategist:\n1. Improve battery life\n2. Run a service campaign"));
    }

    struct CannedStrategist;

    #[async_trait]
    impl Strategist for CannedStrategist {
        async fn suggest(&self, analysis: &NegativeAnalysis) -> Result<String, StrategyError> {
            Ok(format!("1. Fix {} issues", analysis.total_negative))
        }
    }

    struct DownStrategist;

    #[async_trait]
    impl Strategist for DownStrategist {
        async fn suggest(&self, _analysis: &NegativeAnalysis) -> Result<String, StrategyError> {
            Err(StrategyError::EmptyReply)
        }
    }

    fn spawn_server(
        uploads: &Path,
        strategist: Arc<dyn Strategist>,
    ) -> (String, actix_web::dev::ServerHandle) {
        let state = web::Data::new(AppState {
            dataset: FeedbackTable::default(),
            loader: CsvLoader::new(),
            strategist,
            uploads: UploadSettings {
                dir: uploads.to_path_buf(),
                max_bytes: 1024 * 1024,
            },
        });

        let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        (format!("http://{}", addr), handle)
    }

    #[actix_web::test]
    async fn test_submit_round_trip() {
        let uploads = TempDir::new().unwrap();
        let (url, handle) = spawn_server(uploads.path(), Arc::new(CannedStrategist));

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("feedback.csv");
        std::fs::write(&file, "sentiment,feature\nNegative,battery\npositive,battery\n").unwrap();

        let response = submit(&http_client().unwrap(), &url, &file, false)
            .await
            .unwrap();
        assert_eq!(response.analysis.total_negative, 1);
        assert_eq!(response.analysis.cost_by_feature.get("battery"), Some(&5000));
        assert_eq!(response.ai_strategy, "1. Fix 1 issues");

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_submit_surfaces_error_envelope() {
        let uploads = TempDir::new().unwrap();
        let (url, handle) = spawn_server(uploads.path(), Arc::new(DownStrategist));

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("feedback.csv");
        std::fs::write(&file, "sentiment\nnegative\n").unwrap();

        let err = submit(&http_client().unwrap(), &url, &file, false)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("Something went wrong"));

        handle.stop(true).await;
    }
}
