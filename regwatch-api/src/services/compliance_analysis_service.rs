//! Compliance analysis orchestration
//!
//! Resolves sources, their latest content and the features they concern,
//! asks the compliance analyzer about each feature, then records one audit
//! report per answer and executes it straight away.

use super::{
    AuditReportService, ComplianceActionService, FeatureService, ServiceError, ServiceResult,
    SourceContentService, SourceService,
};
use crate::agents::{ComplianceAnalyzer, FeatureAssessment};
use regwatch_common::models::{AuditReportCreateRequest, Feature, Source, SourceContent};
use std::sync::Arc;
use tracing::{info, warn};

/// Upper bound on concurrent analyzer calls per request
pub const MAX_FEATURES_PER_ANALYSIS: usize = 5;

#[derive(Clone)]
pub struct ComplianceAnalysisService {
    sources: SourceService,
    source_contents: SourceContentService,
    features: FeatureService,
    audit_reports: AuditReportService,
    actions: ComplianceActionService,
    analyzer: Option<Arc<ComplianceAnalyzer>>,
}

impl ComplianceAnalysisService {
    pub fn new(
        sources: SourceService,
        source_contents: SourceContentService,
        features: FeatureService,
        audit_reports: AuditReportService,
        actions: ComplianceActionService,
        analyzer: Option<Arc<ComplianceAnalyzer>>,
    ) -> Self {
        Self {
            sources,
            source_contents,
            features,
            audit_reports,
            actions,
            analyzer,
        }
    }

    /// Analyze the features tagged like the first of `source_ids`
    ///
    /// At most [`MAX_FEATURES_PER_ANALYSIS`] features are analyzed. Returns the
    /// ids of the audit reports created.
    pub async fn analyze_sources(&self, source_ids: &[String]) -> ServiceResult<Vec<String>> {
        let analyzer = self.analyzer()?;

        let sources = self.sources.list_by_ids(source_ids).await?;
        let Some(first) = sources.first() else {
            info!("No known sources among {:?}, nothing to analyze", source_ids);
            return Ok(Vec::new());
        };

        let mut features = self.features.list_by_any_tag(first.tags()).await?;
        if features.len() > MAX_FEATURES_PER_ANALYSIS {
            warn!(
                "{} features match source {}, analyzing the first {}",
                features.len(),
                first.id,
                MAX_FEATURES_PER_ANALYSIS
            );
            features.truncate(MAX_FEATURES_PER_ANALYSIS);
        }

        self.analyze(analyzer, &features, &sources).await
    }

    /// Analyze one feature against every source sharing one of its tags
    pub async fn analyze_feature(&self, feature_id: &str) -> ServiceResult<Vec<String>> {
        let analyzer = self.analyzer()?;

        let feature = self.features.get(feature_id).await?;
        let sources: Vec<Source> = self
            .sources
            .list()
            .await?
            .into_iter()
            .filter(|source| feature.shares_tag_with(source.tags()))
            .collect();

        self.analyze(analyzer, std::slice::from_ref(&feature), &sources)
            .await
    }

    fn analyzer(&self) -> ServiceResult<&ComplianceAnalyzer> {
        self.analyzer
            .as_deref()
            .ok_or(ServiceError::LlmUnavailable("Compliance analysis"))
    }

    async fn analyze(
        &self,
        analyzer: &ComplianceAnalyzer,
        features: &[Feature],
        sources: &[Source],
    ) -> ServiceResult<Vec<String>> {
        if features.is_empty() || sources.is_empty() {
            info!(
                "Nothing to analyze ({} feature(s), {} source(s))",
                features.len(),
                sources.len()
            );
            return Ok(Vec::new());
        }

        let urls: Vec<String> = sources.iter().map(|s| s.source_url.clone()).collect();
        let contents = self.source_contents.latest_for_urls(&urls).await?;
        if contents.is_empty() {
            info!("Sources have no scraped content yet, nothing to analyze");
            return Ok(Vec::new());
        }

        let assessments = analyzer.analyze(features, &contents).await?;
        let source_ids: Vec<String> = sources.iter().map(|s| s.id.clone()).collect();
        self.record(assessments, features, &source_ids, &contents)
            .await
    }

    /// Store and execute one audit report per assessment
    ///
    /// `original_status` is the feature's status at analysis time; dismissing
    /// the report restores it.
    async fn record(
        &self,
        assessments: Vec<FeatureAssessment>,
        features: &[Feature],
        source_ids: &[String],
        contents: &[SourceContent],
    ) -> ServiceResult<Vec<String>> {
        let mut report_ids = Vec::with_capacity(assessments.len());

        for FeatureAssessment {
            feature_id,
            assessment,
        } in assessments
        {
            let Some(feature) = features.iter().find(|f| f.id == feature_id) else {
                warn!("Skipping assessment for unrequested feature {}", feature_id);
                continue;
            };
            if assessment.original_status != feature.status {
                warn!(
                    "Model reported feature {} as {} but it is {}",
                    feature.id, assessment.original_status, feature.status
                );
            }

            let report = self
                .audit_reports
                .create(&AuditReportCreateRequest {
                    feature_id,
                    source_ids: source_ids.to_vec(),
                    needs_action: assessment.needs_action,
                    original_status: feature.status,
                    status_change_to: assessment.status_change_to,
                    reason: assessment.reason,
                    confidence: assessment.confidence,
                })
                .await?;
            self.actions.execute(&report.id).await?;
            report_ids.push(report.id);
        }

        info!(
            "Recorded {} audit report(s) from {} source content(s)",
            report_ids.len(),
            contents.len()
        );
        Ok(report_ids)
    }
}
