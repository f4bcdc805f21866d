//! Remote page fetching for the knowledge base

use async_trait::async_trait;
use regwatch_common::config::CompiledDefaults;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Client configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with a fixed user agent and request timeout
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(
            CompiledDefaults::SCRAPER_USER_AGENT,
            Duration::from_secs(CompiledDefaults::SCRAPER_TIMEOUT_SECS),
        )
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {}", url);

        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
