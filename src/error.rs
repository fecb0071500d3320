//! Error types shared by the loader, the strategy client and the server.

use crate::models::ErrorBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

/// Message returned to callers for every failed request.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Failure while reading a feedback CSV.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV headers: {0}")]
    Headers(#[source] csv::Error),

    #[error("failed to parse CSV row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Failure while asking the text-generation provider for a strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("no API key configured for the strategy provider")]
    MissingApiKey,

    #[error("failed to encode analysis: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to strategy provider at {0}")]
    Connect(String),

    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("strategy API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse strategy response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("strategy response contained no message content")]
    EmptyReply,
}

/// Failure of a `POST /analyze` request.
///
/// Every variant is reported to the caller as the same generic 500.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("request has no `{0}` file field")]
    MissingUpload(&'static str),

    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("failed to stage upload: {0}")]
    Stage(#[source] std::io::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

impl ResponseError for AnalyzeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!("Analyze request failed: {}", self);
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: GENERIC_ERROR_MESSAGE.to_string(),
        })
    }
}
