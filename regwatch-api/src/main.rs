//! regwatch-api - regulatory compliance tracking service
//!
//! Serves the REST and SSE API over a SQLite database, scrapes regulatory
//! sources on demand and, when an Anthropic API key is configured, tags
//! features and sources and analyzes compliance.

use anyhow::{Context, Result};
use clap::Parser;
use regwatch_api::agents::PromptLibrary;
use regwatch_api::config::{Args, ServiceConfig};
use regwatch_api::llm::{AnthropicClient, LlmClient};
use regwatch_api::services::HttpPageFetcher;
use regwatch_api::AppState;
use regwatch_common::config::load_toml_config;
use regwatch_common::db::init_database_pool;
use regwatch_common::events::EventBus;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win over it
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = ServiceConfig::resolve(args, toml_config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting regwatch-api v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}, {})",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let db_pool = init_database_pool(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    info!("Database: {}", config.database_url);

    let event_bus = EventBus::new(config.event_capacity);

    let llm: Option<Arc<dyn LlmClient>> = match config.llm.clone() {
        Some(llm_config) => {
            let client = AnthropicClient::new(llm_config)
                .context("Failed to initialize Anthropic client")?;
            info!("LLM: {}", client.model());
            Some(Arc::new(client) as Arc<dyn LlmClient>)
        }
        None => None,
    };

    let fetcher = HttpPageFetcher::new(&config.scraper_user_agent, config.scraper_timeout)
        .context("Failed to initialize page fetcher")?;

    let prompts = match &config.prompt_dir {
        Some(dir) => PromptLibrary::new(dir.clone()),
        None => PromptLibrary::bundled(),
    };
    info!("Prompt directory: {}", prompts.dir().display());

    let state = AppState::new(db_pool, event_bus, llm, Arc::new(fetcher), prompts);
    let app = regwatch_api::build_router(state)
        .layer(regwatch_api::cors_layer(&config.cors_origins));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
