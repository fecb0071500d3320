//! HTTP service: the analyze endpoint, the read-side dashboard API and the
//! static dashboard assets.
//!
//! All per-process resources (dataset, strategy client, upload settings)
//! are built once at startup and handed to handlers through
//! [`web::Data<AppState>`].

pub mod handlers;
pub mod upload;

use crate::loader::{CsvLoader, FeedbackTable};
use crate::strategy::Strategist;
use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub use upload::UploadSettings;

/// Shared, read-only request context.
pub struct AppState {
    /// Dataset behind the dashboard routes.
    pub dataset: FeedbackTable,
    pub loader: CsvLoader,
    pub strategist: Arc<dyn Strategist>,
    pub uploads: UploadSettings,
}

/// Listener and asset settings for [`run`].
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
}

/// Register the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::analyze)
        .service(handlers::sentiment)
        .service(handlers::features)
        .service(handlers::competitors)
        .service(handlers::painpoints)
        .service(handlers::ratings)
        .service(handlers::filter)
        .service(handlers::recommendations)
        .service(handlers::summary);
}

/// Static dashboard assets; mount after the API routes.
pub fn static_files(public_dir: &Path) -> Files {
    Files::new("/", public_dir).index_file("index.html")
}

/// Run the server until it is stopped.
pub async fn run(settings: ServerSettings, state: AppState) -> std::io::Result<()> {
    std::fs::create_dir_all(&state.uploads.dir)?;

    let state = web::Data::new(state);
    let public_dir = settings.public_dir.clone();

    info!(
        "Serving dashboard from {} at http://{}:{}/",
        public_dir.display(),
        settings.host,
        settings.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .service(static_files(&public_dir))
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StrategyError, GENERIC_ERROR_MESSAGE};
    use crate::models::{AnalyzeResponse, ErrorBody, FilterInsights, NegativeAnalysis, Recommendations};
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use async_trait::async_trait;
    use tempfile::TempDir;

    const BOUNDARY: &str = "feedlens-test-boundary";

    const DATASET: &str = "\
vehicle,sentiment,feature,feature_sentiment,competitor,pain_point,rating
Nexon EV,Positive,battery,Positive,MG ZS EV,,4.5
Safari,Negative,comfort,Negative,Mahindra XUV700,service delay,2
Safari,Positive,comfort,Positive,,,5
";

    struct EchoStrategist;

    #[async_trait]
    impl Strategist for EchoStrategist {
        async fn suggest(&self, analysis: &NegativeAnalysis) -> Result<String, StrategyError> {
            Ok(format!("1. Address {} complaints", analysis.total_negative))
        }
    }

    struct FailingStrategist;

    #[async_trait]
    impl Strategist for FailingStrategist {
        async fn suggest(&self, _analysis: &NegativeAnalysis) -> Result<String, StrategyError> {
            Err(StrategyError::Api {
                status: 401,
                body: "invalid api key".to_string(),
            })
        }
    }

    fn state(upload_dir: &Path, strategist: Arc<dyn Strategist>) -> web::Data<AppState> {
        web::Data::new(AppState {
            dataset: CsvLoader::new().parse_str(DATASET).unwrap(),
            loader: CsvLoader::new(),
            strategist,
            uploads: UploadSettings {
                dir: upload_dir.to_path_buf(),
                max_bytes: 1024,
            },
        })
    }

    fn multipart_request(field: &str, content: &str) -> test::TestRequest {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"feedback.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY,
        );
        test::TestRequest::post()
            .uri("/analyze")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[actix_web::test]
    async fn test_analyze_returns_aggregate_and_strategy() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure),
        )
        .await;

        let csv = "sentiment,feature\nNegative,battery\npositive,battery\nNEGATIVE,\n";
        let resp = test::call_service(&app, multipart_request("csvFile", csv).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: AnalyzeResponse = test::read_body_json(resp).await;
        assert_eq!(body.analysis.total_negative, 2);
        assert_eq!(body.analysis.feature_breakdown.get("unknown"), Some(&1));
        assert_eq!(body.analysis.cost_estimate, 10000);
        assert_eq!(body.ai_strategy, "1. Address 2 complaints");

        assert!(dir_is_empty(uploads.path()));
    }

    #[actix_web::test]
    async fn test_analyze_header_only_file() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            multipart_request("csvFile", "sentiment,feature\n").to_request(),
        )
        .await;

        let body: AnalyzeResponse = test::read_body_json(resp).await;
        assert_eq!(body.analysis, NegativeAnalysis::default());
    }

    #[actix_web::test]
    async fn test_strategy_failure_is_generic_500_and_cleans_up() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(FailingStrategist)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            multipart_request("csvFile", "sentiment\nnegative\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, GENERIC_ERROR_MESSAGE);
        assert!(dir_is_empty(uploads.path()));
    }

    #[actix_web::test]
    async fn test_missing_file_field_is_generic_500() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            multipart_request("notes", "sentiment\nnegative\n").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, GENERIC_ERROR_MESSAGE);
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure),
        )
        .await;

        let csv = format!("sentiment\n{}", "negative\n".repeat(200));
        let resp = test::call_service(&app, multipart_request("csvFile", &csv).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(dir_is_empty(uploads.path()));
    }

    #[actix_web::test]
    async fn test_read_routes_apply_filters() {
        let uploads = TempDir::new().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/filter?vehicle=safari&sentiment=")
            .to_request();
        let kpis: FilterInsights = test::call_and_read_body_json(&app, req).await;
        assert_eq!(kpis.total_reviews, 2);
        assert_eq!(kpis.avg_rating, Some(3.5));
        assert_eq!(kpis.neg_percent, 50.0);

        let req = test::TestRequest::get().uri("/sentiment").to_request();
        let overview: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(overview["Positive"], 2);

        let req = test::TestRequest::get().uri("/features").to_request();
        let pivot: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pivot["Negative"]["battery"], 0);
        assert_eq!(pivot["Positive"]["comfort"], 1);

        let req = test::TestRequest::get().uri("/ratings").to_request();
        let ratings: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ratings["Safari"], 3.5);

        let req = test::TestRequest::get()
            .uri("/competitors?vehicle=nexon")
            .to_request();
        let competitors: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(competitors, serde_json::json!({"MG ZS EV": 1}));

        let req = test::TestRequest::get().uri("/painpoints").to_request();
        let points: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(points["service delay"], 1);

        let req = test::TestRequest::get()
            .uri("/summary?vehicle=nexon")
            .to_request();
        let summary: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(summary["summary"]
            .as_str()
            .unwrap()
            .starts_with("Analyzed 1 posts. Dominant sentiment: Positive."));

        let req = test::TestRequest::get().uri("/recommendations").to_request();
        let recs: Recommendations = test::call_and_read_body_json(&app, req).await;
        assert_eq!(recs.negative[0].issue, "Competition from MG ZS EV");
    }

    #[actix_web::test]
    async fn test_static_index_is_served() {
        let uploads = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        std::fs::write(public.path().join("index.html"), "<h1>feedlens</h1>").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state(uploads.path(), Arc::new(EchoStrategist)))
                .configure(configure)
                .service(static_files(public.path())),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "<h1>feedlens</h1>".as_bytes());

        let req = test::TestRequest::get().uri("/filter").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_dashboard_script_renders_values_as_text() {
        let public = Path::new(env!("CARGO_MANIFEST_DIR")).join("public");
        let app = test::init_service(App::new().service(static_files(&public))).await;

        let req = test::TestRequest::get().uri("/app.js").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let script = std::str::from_utf8(&body).unwrap();

        assert!(script.contains("function fillTable"));
        assert!(script.contains("textContent"));
        assert!(!script.contains("innerHTML"));
    }
}
