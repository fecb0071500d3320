//! Chat-completions client for strategy generation.
//!
//! Sends the negative-feedback aggregate as the user message together with
//! a fixed strategist instruction and returns the first choice's content.

use crate::error::StrategyError;
use crate::models::NegativeAnalysis;
use crate::strategy::Strategist;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the strategy provider.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            temperature: None,
            timeout_seconds: 120,
        }
    }
}

/// Message in a chat-completions request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`Strategist`] backed by a chat-completions endpoint.
pub struct ChatStrategist {
    config: StrategyConfig,
    http_client: reqwest::Client,
}

impl ChatStrategist {
    /// Create a client; the HTTP connection pool lives as long as the strategist.
    pub fn new(config: StrategyConfig) -> Result<Self, StrategyError> {
        info!(
            "Initializing strategy client with model {} at {}",
            config.model, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(StrategyError::Request)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, analysis: &NegativeAnalysis) -> Result<ChatRequest, StrategyError> {
        Ok(ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: STRATEGIST_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: serde_json::to_string(analysis)?,
                },
            ],
            temperature: self.config.temperature,
        })
    }
}

#[async_trait]
impl Strategist for ChatStrategist {
    async fn suggest(&self, analysis: &NegativeAnalysis) -> Result<String, StrategyError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(StrategyError::MissingApiKey)?;

        let request = self.build_request(analysis)?;
        debug!(
            "Requesting strategy for {} negative rows",
            analysis.total_negative
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StrategyError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    StrategyError::Connect(self.config.base_url.clone())
                } else {
                    StrategyError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StrategyError::Api { status, body });
        }

        let chat_response: ChatResponse = response.json().await.map_err(StrategyError::Decode)?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(StrategyError::EmptyReply)
    }
}

/// Fixed instruction sent with every aggregate.
pub const STRATEGIST_SYSTEM_PROMPT: &str = r#"You are an AI marketing & operation strategist for Tata Motors.
Based on the Negative feedback data i provide, generate actionable strategies
to reduce complaints, improve sales, and plan marketing campaigns.
Present your suggestions as numbered points, each starting with a number"#;
