//! Anthropic Messages API client
//!
//! Structured output uses tool use: the request declares one tool carrying the
//! output schema and forces `tool_choice` to it, so the answer arrives as the
//! tool's `input` object.

use super::{LlmClient, LlmError, StructuredRequest};
use async_trait::async_trait;
use regwatch_common::config::CompiledDefaults;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection and sampling settings for [`AnthropicClient`]
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: CompiledDefaults::LLM_MODEL.to_string(),
            base_url: CompiledDefaults::LLM_BASE_URL.to_string(),
            temperature: CompiledDefaults::LLM_TEMPERATURE,
            max_tokens: CompiledDefaults::LLM_MAX_TOKENS,
            timeout: Duration::from_secs(CompiledDefaults::LLM_TIMEOUT_SECS),
        }
    }
}

pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("Anthropic API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a StructuredRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: request
                    .messages
                    .iter()
                    .map(|text| TextBlock {
                        kind: "text",
                        text,
                    })
                    .collect(),
            }],
            tools: vec![Tool {
                name: &request.output_name,
                description: &request.output_description,
                input_schema: &request.schema,
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: &request.output_name,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn structured(&self, request: StructuredRequest) -> Result<serde_json::Value, LlmError> {
        debug!(
            "Sending structured request '{}' to model {}",
            request.output_name, self.config.model
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic API request failed: {}", e);
                LlmError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Anthropic API error ({}): {}", status, body);

            return match status.as_u16() {
                401 | 403 => Err(LlmError::Authentication),
                429 => Err(LlmError::RateLimited),
                code => Err(LlmError::Api(code, body)),
            };
        }

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            "Anthropic response: stop_reason={:?}, input_tokens={}, output_tokens={}",
            parsed.stop_reason, parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::ToolUse { name, input } if name == request.output_name => Some(input),
                _ => None,
            })
            .ok_or(LlmError::MissingStructuredOutput(request.output_name))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Serialize)]
struct TextBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
