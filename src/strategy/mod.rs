//! Strategy suggestions from a text-generation provider.
//!
//! The server only depends on the [`Strategist`] trait; [`ChatStrategist`]
//! is the production implementation backed by an OpenAI-compatible
//! chat-completions API.

pub mod client;

use crate::error::StrategyError;
use crate::models::NegativeAnalysis;
use async_trait::async_trait;

pub use client::{ChatStrategist, StrategyConfig};

/// Produces free-text strategy suggestions for an aggregate.
#[async_trait]
pub trait Strategist: Send + Sync {
    /// Ask for suggestions and return the reply verbatim.
    async fn suggest(&self, analysis: &NegativeAnalysis) -> Result<String, StrategyError>;
}
