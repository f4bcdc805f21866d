//! Audit report review actions
//!
//! - execute: apply the proposed status if the report needs action
//! - dismiss: mark the report dismissed and restore the feature's original status
//! - verify: mark the report verified and set the proposed status
//!
//! The actions are not mutually exclusive: any of them may run on a report in
//! any review state. Acting on an already reviewed report is logged.

use super::{AuditReportService, FeatureService, ServiceResult};
use regwatch_common::models::{AuditReport, AuditReportStatus};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ComplianceActionService {
    audit_reports: AuditReportService,
    features: FeatureService,
}

impl ComplianceActionService {
    pub fn new(audit_reports: AuditReportService, features: FeatureService) -> Self {
        Self {
            audit_reports,
            features,
        }
    }

    /// Apply the report's proposed status when `needs_action` is set
    ///
    /// The report's own review status is left unchanged.
    pub async fn execute(&self, audit_report_id: &str) -> ServiceResult<AuditReport> {
        let report = self.audit_reports.get(audit_report_id).await?;
        warn_if_reviewed(&report, "execute");

        if report.needs_action {
            self.features
                .update_status(&report.feature_id, report.status_change_to)
                .await?;
            info!(
                "Executed audit report {}: feature {} -> {}",
                report.id, report.feature_id, report.status_change_to
            );
        } else {
            self.features.get(&report.feature_id).await?;
            info!("Audit report {} needs no action", report.id);
        }

        Ok(report)
    }

    pub async fn dismiss(&self, audit_report_id: &str) -> ServiceResult<AuditReport> {
        let report = self.audit_reports.get(audit_report_id).await?;
        warn_if_reviewed(&report, "dismiss");

        // Fail on a dangling feature reference before touching the report.
        self.features.get(&report.feature_id).await?;

        let report = self
            .audit_reports
            .update_status(audit_report_id, AuditReportStatus::Dismissed)
            .await?;
        self.features
            .update_status(&report.feature_id, report.original_status)
            .await?;

        info!(
            "Dismissed audit report {}: feature {} restored to {}",
            report.id, report.feature_id, report.original_status
        );
        Ok(report)
    }

    pub async fn verify(&self, audit_report_id: &str) -> ServiceResult<AuditReport> {
        let report = self.audit_reports.get(audit_report_id).await?;
        warn_if_reviewed(&report, "verify");

        // Fail on a dangling feature reference before touching the report.
        self.features.get(&report.feature_id).await?;

        let report = self
            .audit_reports
            .update_status(audit_report_id, AuditReportStatus::Verified)
            .await?;
        self.features
            .update_status(&report.feature_id, report.status_change_to)
            .await?;

        info!(
            "Verified audit report {}: feature {} set to {}",
            report.id, report.feature_id, report.status_change_to
        );
        Ok(report)
    }
}

fn warn_if_reviewed(report: &AuditReport, action: &str) {
    if report.status.is_terminal() {
        warn!(
            "Running {} on audit report {} which is already {}",
            action, report.id, report.status
        );
    }
}
