//! LLM client abstraction
//!
//! Agents talk to the model through [`LlmClient`], which returns the JSON
//! object the model produced for a declared schema. The client is built once
//! at startup and injected as `Arc<dyn LlmClient>`.

mod anthropic;

pub use anthropic::{AnthropicClient, AnthropicConfig};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected by LLM provider")]
    Authentication,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned no structured output for {0}")]
    MissingStructuredOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Parse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// One structured-output call
///
/// The model is forced to answer by "calling" a single tool whose input
/// schema is `schema`; the tool input is the result.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredRequest {
    pub system: String,
    pub messages: Vec<String>,
    pub output_name: String,
    pub output_description: String,
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one request and return the JSON object matching its schema
    async fn structured(&self, request: StructuredRequest) -> Result<serde_json::Value, LlmError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
