//! regwatch-api library interface
//!
//! Wires repositories, agents and services into [`AppState`] and exposes the
//! router so integration tests can drive it without a socket.

pub mod agents;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod llm;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::agents::{ComplianceAnalyzer, FeatureTagger, PromptLibrary, SourceTagger};
use crate::db::{
    AuditReportRepository, FeatureRepository, SourceContentRepository, SourceRepository,
};
use crate::llm::LlmClient;
use crate::services::{
    AuditReportService, ComplianceActionService, ComplianceAnalysisService, FeatureService,
    KnowledgeBaseService, PageFetcher, ResetService, SourceContentService, SourceService,
};
use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use regwatch_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub event_bus: EventBus,
    pub features: FeatureService,
    pub sources: SourceService,
    pub source_contents: SourceContentService,
    pub audit_reports: AuditReportService,
    pub actions: ComplianceActionService,
    pub analysis: ComplianceAnalysisService,
    pub knowledge_base: KnowledgeBaseService,
    pub reset: ResetService,
    /// Model name when an LLM client is configured
    pub llm_model: Option<String>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build every service over one pool and event bus
    ///
    /// Without an LLM client the taggers and the analyzer are disabled.
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        llm: Option<Arc<dyn LlmClient>>,
        fetcher: Arc<dyn PageFetcher>,
        prompts: PromptLibrary,
    ) -> Self {
        let llm_model = llm.as_ref().map(|client| client.model().to_string());
        let (feature_tagger, source_tagger, analyzer) = match llm {
            Some(llm) => (
                Some(Arc::new(FeatureTagger::new(llm.clone(), prompts.clone()))),
                Some(Arc::new(SourceTagger::new(llm.clone(), prompts.clone()))),
                Some(Arc::new(ComplianceAnalyzer::new(llm, prompts))),
            ),
            None => {
                warn!("No LLM configured: tagging and compliance analysis are disabled");
                (None, None, None)
            }
        };

        let features = FeatureService::new(
            FeatureRepository::new(db.clone(), event_bus.clone()),
            feature_tagger,
            event_bus.clone(),
        );
        let sources = SourceService::new(
            SourceRepository::new(db.clone(), event_bus.clone()),
            event_bus.clone(),
        );
        let source_contents =
            SourceContentService::new(SourceContentRepository::new(db.clone(), event_bus.clone()));
        let audit_reports = AuditReportService::new(
            AuditReportRepository::new(db.clone(), event_bus.clone()),
            event_bus.clone(),
        );
        let actions = ComplianceActionService::new(audit_reports.clone(), features.clone());
        let analysis = ComplianceAnalysisService::new(
            sources.clone(),
            source_contents.clone(),
            features.clone(),
            audit_reports.clone(),
            actions.clone(),
            analyzer,
        );
        let knowledge_base = KnowledgeBaseService::new(
            sources.clone(),
            source_contents.clone(),
            fetcher,
            source_tagger,
        );
        let reset = ResetService::new(
            features.clone(),
            sources.clone(),
            source_contents.clone(),
            audit_reports.clone(),
        );

        Self {
            db,
            event_bus,
            features,
            sources,
            source_contents,
            audit_reports,
            actions,
            analysis,
            knowledge_base,
            reset,
            llm_model,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::feature_routes())
        .merge(api::source_routes())
        .merge(api::audit_report_routes())
        .merge(api::compliance_routes())
        .merge(api::script_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy allowing `origins` with any method and header
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::any())
}
