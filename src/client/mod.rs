//! Terminal clients for a running feedlens server.
//!
//! `upload` submits a CSV to `/analyze` and prints the exchange as a
//! conversation; `dashboard` pulls the read-side routes and prints the
//! KPI block, rankings and recommendations.

pub mod dashboard;
pub mod upload;

use crate::models::ErrorBody;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Generous enough to cover a slow strategy reply behind `/analyze`.
const CLIENT_TIMEOUT_SECS: u64 = 300;

/// HTTP client shared by the terminal commands.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
        .build()
        .context("Failed to create HTTP client")
}

/// Join a server base URL and a route path.
pub fn endpoint(server_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        server_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Decode a JSON body, turning error envelopes into errors.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response from {}", url))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        bail!("{} returned {}: {}", url, status, message);
    }

    serde_json::from_str(&text).with_context(|| format!("Unexpected response from {}", url))
}

/// Format a currency amount with thousands separators.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
