//! Audit report service

use super::ServiceResult;
use crate::db::AuditReportRepository;
use chrono::{DateTime, Utc};
use futures::Stream;
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{AuditReport, AuditReportCreateRequest, AuditReportStatus};
use regwatch_common::{sse, Error};
use serde::Serialize;
use tracing::info;

/// Payload shared by the audit report change messages
#[derive(Debug, Clone, Serialize)]
pub struct AuditReportChange {
    pub operation_type: ChangeOperation,
    pub audit_report_id: String,
    pub audit_report_data: Option<AuditReport>,
    pub timestamp: DateTime<Utc>,
}

/// Messages of the audit report change feed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AuditReportFeedMessage {
    InitialData { audit_reports: Vec<AuditReport> },
    AuditReportAdded(AuditReportChange),
    AuditReportUpdated(AuditReportChange),
    AuditReportDeleted(AuditReportChange),
    Error { message: String },
}

impl AuditReportFeedMessage {
    fn from_change(change: AuditReportChange) -> Self {
        match change.operation_type {
            ChangeOperation::Insert => AuditReportFeedMessage::AuditReportAdded(change),
            ChangeOperation::Update => AuditReportFeedMessage::AuditReportUpdated(change),
            ChangeOperation::Delete => AuditReportFeedMessage::AuditReportDeleted(change),
        }
    }
}

#[derive(Clone)]
pub struct AuditReportService {
    repository: AuditReportRepository,
    event_bus: EventBus,
}

impl AuditReportService {
    pub fn new(repository: AuditReportRepository, event_bus: EventBus) -> Self {
        Self {
            repository,
            event_bus,
        }
    }

    pub async fn create(&self, request: &AuditReportCreateRequest) -> ServiceResult<AuditReport> {
        if !(0.0..=1.0).contains(&request.confidence) {
            return Err(Error::InvalidInput(format!(
                "confidence must be between 0 and 1, got {}",
                request.confidence
            ))
            .into());
        }

        let report = self.repository.insert(request).await?;
        info!(
            "Created audit report {} for feature {} ({} -> {}, needs_action={})",
            report.id,
            report.feature_id,
            report.original_status,
            report.status_change_to,
            report.needs_action
        );
        Ok(report)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<AuditReport> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Audit report", id).into())
    }

    pub async fn list(&self) -> ServiceResult<Vec<AuditReport>> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn list_by_source(&self, source_id: &str) -> ServiceResult<Vec<AuditReport>> {
        Ok(self.repository.list_by_source(source_id).await?)
    }

    /// Most recent pending report for a feature, if any
    pub async fn pending_for_feature(&self, feature_id: &str) -> ServiceResult<Option<AuditReport>> {
        Ok(self.repository.latest_pending_for_feature(feature_id).await?)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AuditReportStatus,
    ) -> ServiceResult<AuditReport> {
        self.repository
            .update_status(id, status)
            .await?
            .ok_or_else(|| Error::not_found("Audit report", id).into())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.repository.delete_all().await?)
    }

    /// Snapshot of all reports followed by every report change
    pub fn stream(&self) -> impl Stream<Item = AuditReportFeedMessage> + Send + 'static {
        let repository = self.repository.clone();

        sse::change_feed(
            "audit reports",
            self.event_bus.subscribe(),
            move || {
                let repository = repository.clone();
                async move {
                    let audit_reports = repository.list_all().await?;
                    Ok(AuditReportFeedMessage::InitialData { audit_reports })
                }
            },
            |event| match event {
                RegwatchEvent::AuditReportChanged {
                    operation,
                    audit_report_id,
                    audit_report,
                    timestamp,
                } => Some(AuditReportFeedMessage::from_change(AuditReportChange {
                    operation_type: operation,
                    audit_report_id,
                    audit_report_data: audit_report,
                    timestamp,
                })),
                _ => None,
            },
            |message| AuditReportFeedMessage::Error { message },
        )
    }
}
