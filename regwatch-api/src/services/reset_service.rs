//! Demo reset: clears scraped and generated data, keeps features

use super::{
    AuditReportService, FeatureService, ServiceResult, SourceContentService, SourceService,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub audit_reports_deleted: u64,
    pub source_contents_deleted: u64,
    pub sources_deleted: u64,
    pub features_reset: u64,
}

#[derive(Clone)]
pub struct ResetService {
    features: FeatureService,
    sources: SourceService,
    source_contents: SourceContentService,
    audit_reports: AuditReportService,
}

impl ResetService {
    pub fn new(
        features: FeatureService,
        sources: SourceService,
        source_contents: SourceContentService,
        audit_reports: AuditReportService,
    ) -> Self {
        Self {
            features,
            sources,
            source_contents,
            audit_reports,
        }
    }

    /// Delete all audit reports, source contents and sources, and set every
    /// feature back to `pending`
    pub async fn reset(&self) -> ServiceResult<ResetSummary> {
        let summary = ResetSummary {
            audit_reports_deleted: self.audit_reports.delete_all().await?,
            source_contents_deleted: self.source_contents.delete_all().await?,
            sources_deleted: self.sources.delete_all().await?,
            features_reset: self.features.reset_all_statuses().await?,
        };

        info!("Reset completed: {:?}", summary);
        Ok(summary)
    }
}
