//! Domain services
//!
//! Services validate requests, fill defaults and orchestrate repositories,
//! agents and the page fetcher. Handlers call services only.

pub mod audit_report_service;
pub mod compliance_action_service;
pub mod compliance_analysis_service;
pub mod content_extractor;
pub mod feature_service;
pub mod knowledge_base_service;
pub mod page_fetcher;
pub mod reset_service;
pub mod source_content_service;
pub mod source_service;

pub use audit_report_service::{AuditReportFeedMessage, AuditReportService};
pub use compliance_action_service::ComplianceActionService;
pub use compliance_analysis_service::{ComplianceAnalysisService, MAX_FEATURES_PER_ANALYSIS};
pub use content_extractor::{extract_readable, ReadablePage};
pub use feature_service::{FeatureFeedMessage, FeatureService};
pub use knowledge_base_service::{KnowledgeBaseService, RefreshFailure, RefreshOutcome};
pub use page_fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use reset_service::{ResetService, ResetSummary};
pub use source_content_service::SourceContentService;
pub use source_service::{SourceFeedMessage, SourceService};

use crate::agents::AgentError;
use thiserror::Error;

/// Errors surfaced by services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Persistence, lookup and validation failures
    #[error(transparent)]
    Common(#[from] regwatch_common::Error),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The operation needs the LLM but no API key was configured
    #[error("{0} requires an LLM API key")]
    LlmUnavailable(&'static str),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Common(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
