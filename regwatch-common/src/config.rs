//! Configuration file loading
//!
//! Settings resolve in priority order:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! This module covers tier 3 and 4. A missing file is not an error: the
//! service logs a warning and starts on defaults. A file that exists but does
//! not parse is a [`Error::Config`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Contents of `config.toml`; every table and key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Capacity of the change-event broadcast channel
    pub event_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Directory holding prompt templates and the tag vocabulary
    pub prompt_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: CompiledDefaults::LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Option<Vec<String>>,
}

/// Values used when neither CLI, environment nor TOML provide one
pub struct CompiledDefaults;

impl CompiledDefaults {
    pub const HOST: &'static str = "127.0.0.1";
    pub const PORT: u16 = 5000;
    pub const DATABASE_URL: &'static str = "sqlite://regwatch.db";
    pub const EVENT_CAPACITY: usize = 256;
    pub const LLM_BASE_URL: &'static str = "https://api.anthropic.com";
    pub const LLM_MODEL: &'static str = "claude-3-5-sonnet-latest";
    pub const LLM_TEMPERATURE: f32 = 0.2;
    pub const LLM_MAX_TOKENS: u32 = 2048;
    pub const LLM_TIMEOUT_SECS: u64 = 60;
    pub const SCRAPER_USER_AGENT: &'static str =
        "Mozilla/5.0 (compatible; regwatch/0.1; +https://localhost)";
    pub const SCRAPER_TIMEOUT_SECS: u64 = 30;
    pub const LOG_LEVEL: &'static str = "regwatch_api=info,regwatch_common=info,tower_http=info";

    pub fn cors_origins() -> Vec<String> {
        vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5000".to_string(),
            "http://127.0.0.1:5000".to_string(),
        ]
    }
}

/// Platform location of the user config file (`~/.config/regwatch/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("regwatch").join("config.toml"))
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

/// Load the config file at `path`, or at [`default_config_path`] when `None`
///
/// Missing files degrade to defaults with a warning.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}
