//! Configuration resolution for regwatch-api
//!
//! Priority: CLI flag → environment variable → TOML file → compiled default.
//! clap covers the first two tiers (every flag has an `env` fallback), the
//! TOML tiers come from [`regwatch_common::config`].

use crate::llm::AnthropicConfig;
use clap::Parser;
use regwatch_common::config::{CompiledDefaults, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Command-line arguments for regwatch-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "regwatch-api")]
#[command(about = "Regulatory compliance tracking service")]
#[command(version)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "REGWATCH_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "REGWATCH_PORT")]
    pub port: Option<u16>,

    /// SQLite database URL, e.g. sqlite://regwatch.db
    #[arg(long, env = "REGWATCH_DATABASE_URL")]
    pub database_url: Option<String>,

    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long, env = "REGWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory with prompt templates and regulation_tags.json
    #[arg(long, env = "REGWATCH_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,

    /// Anthropic API key; LLM features are disabled without one
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL")]
    pub anthropic_model: Option<String>,

    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub anthropic_base_url: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub event_capacity: usize,
    /// `None` when no API key was found in any tier
    pub llm: Option<AnthropicConfig>,
    pub prompt_dir: Option<PathBuf>,
    pub scraper_user_agent: String,
    pub scraper_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn resolve(args: Args, toml: TomlConfig) -> Self {
        let api_key = args
            .anthropic_api_key
            .filter(|key| is_valid_key(key))
            .map(|key| (key, "environment"))
            .or_else(|| {
                toml.llm
                    .api_key
                    .clone()
                    .filter(|key| is_valid_key(key))
                    .map(|key| (key, "TOML"))
            });

        let llm = api_key.map(|(api_key, tier)| {
            info!("Anthropic API key loaded from {}", tier);
            AnthropicConfig {
                api_key,
                model: args
                    .anthropic_model
                    .or(toml.llm.model)
                    .unwrap_or_else(|| CompiledDefaults::LLM_MODEL.to_string()),
                base_url: args
                    .anthropic_base_url
                    .or(toml.llm.base_url)
                    .unwrap_or_else(|| CompiledDefaults::LLM_BASE_URL.to_string()),
                temperature: toml
                    .llm
                    .temperature
                    .unwrap_or(CompiledDefaults::LLM_TEMPERATURE),
                max_tokens: toml
                    .llm
                    .max_tokens
                    .unwrap_or(CompiledDefaults::LLM_MAX_TOKENS),
                timeout: Duration::from_secs(
                    toml.llm
                        .timeout_secs
                        .unwrap_or(CompiledDefaults::LLM_TIMEOUT_SECS),
                ),
            }
        });

        Self {
            host: args
                .host
                .or(toml.server.host)
                .unwrap_or_else(|| CompiledDefaults::HOST.to_string()),
            port: args
                .port
                .or(toml.server.port)
                .unwrap_or(CompiledDefaults::PORT),
            database_url: args
                .database_url
                .or(toml.database.url)
                .unwrap_or_else(|| CompiledDefaults::DATABASE_URL.to_string()),
            event_capacity: toml
                .server
                .event_capacity
                .unwrap_or(CompiledDefaults::EVENT_CAPACITY),
            llm,
            prompt_dir: args.prompt_dir.or(toml.llm.prompt_dir),
            scraper_user_agent: toml
                .scraper
                .user_agent
                .unwrap_or_else(|| CompiledDefaults::SCRAPER_USER_AGENT.to_string()),
            scraper_timeout: Duration::from_secs(
                toml.scraper
                    .timeout_secs
                    .unwrap_or(CompiledDefaults::SCRAPER_TIMEOUT_SECS),
            ),
            cors_origins: toml
                .cors
                .allowed_origins
                .unwrap_or_else(CompiledDefaults::cors_origins),
            log_level: toml.logging.level,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regwatch_common::config::parse_toml_config;

    #[test]
    fn defaults_without_any_input() {
        let config = ServiceConfig::resolve(Args::default(), TomlConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.database_url, CompiledDefaults::DATABASE_URL);
        assert!(config.llm.is_none());
        assert_eq!(config.cors_origins, CompiledDefaults::cors_origins());
    }

    #[test]
    fn cli_beats_toml() {
        let toml = parse_toml_config(
            r#"
            [server]
            port = 8080
            host = "0.0.0.0"

            [llm]
            api_key = "toml-key"
            model = "toml-model"
            "#,
        )
        .unwrap();
        let args = Args {
            port: Some(9090),
            anthropic_api_key: Some("cli-key".into()),
            ..Args::default()
        };

        let config = ServiceConfig::resolve(args, toml);
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");
        let llm = config.llm.unwrap();
        assert_eq!(llm.api_key, "cli-key");
        assert_eq!(llm.model, "toml-model");
    }

    #[test]
    fn blank_key_falls_through_to_toml() {
        let toml = parse_toml_config("[llm]\napi_key = \"toml-key\"").unwrap();
        let args = Args {
            anthropic_api_key: Some("   ".into()),
            ..Args::default()
        };

        let config = ServiceConfig::resolve(args, toml);
        assert_eq!(config.llm.unwrap().api_key, "toml-key");
    }

    #[test]
    fn blank_key_everywhere_disables_llm() {
        let toml = parse_toml_config("[llm]\napi_key = \"\"").unwrap();
        let config = ServiceConfig::resolve(Args::default(), toml);
        assert!(config.llm.is_none());
    }
}
