//! Audit report persistence

use regwatch_common::db::{decode_list, encode_list};
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{
    new_id, AuditReport, AuditReportCreateRequest, AuditReportStatus,
};
use regwatch_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

const SELECT_REPORTS: &str = r#"
    SELECT id, feature_id, source_ids, needs_action, original_status, status_change_to,
           reason, confidence, status, created_at, updated_at
    FROM audit_reports
"#;

#[derive(Clone)]
pub struct AuditReportRepository {
    pool: SqlitePool,
    event_bus: EventBus,
}

impl AuditReportRepository {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    /// Persist a new report in `pending` review state
    pub async fn insert(&self, request: &AuditReportCreateRequest) -> Result<AuditReport> {
        let report = AuditReport {
            id: new_id(),
            feature_id: request.feature_id.clone(),
            source_ids: request.source_ids.clone(),
            needs_action: request.needs_action,
            original_status: request.original_status,
            status_change_to: request.status_change_to,
            reason: request.reason.clone(),
            confidence: request.confidence,
            status: AuditReportStatus::Pending,
            created_at: time::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO audit_reports (
                id, feature_id, source_ids, needs_action, original_status, status_change_to,
                reason, confidence, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&report.id)
        .bind(&report.feature_id)
        .bind(encode_list(&report.source_ids)?)
        .bind(report.needs_action)
        .bind(report.original_status.as_str())
        .bind(report.status_change_to.as_str())
        .bind(&report.reason)
        .bind(report.confidence)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Inserted audit report {} for feature {}",
            report.id, report.feature_id
        );
        self.publish(ChangeOperation::Insert, &report.id, Some(report.clone()));
        Ok(report)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AuditReport>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_REPORTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(report_from_row).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<AuditReport>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at, rowid", SELECT_REPORTS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(report_from_row).collect()
    }

    /// Reports that cite `source_id`
    pub async fn list_by_source(&self, source_id: &str) -> Result<Vec<AuditReport>> {
        let rows = sqlx::query(&format!(
            "{} WHERE EXISTS (SELECT 1 FROM json_each(audit_reports.source_ids) WHERE json_each.value = ?) ORDER BY created_at, rowid",
            SELECT_REPORTS
        ))
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(report_from_row).collect()
    }

    /// Most recent report still awaiting review for `feature_id`
    pub async fn latest_pending_for_feature(&self, feature_id: &str) -> Result<Option<AuditReport>> {
        let row = sqlx::query(&format!(
            "{} WHERE feature_id = ? AND status = 'pending' ORDER BY created_at DESC, rowid DESC LIMIT 1",
            SELECT_REPORTS
        ))
        .bind(feature_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(report_from_row).transpose()
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AuditReportStatus,
    ) -> Result<Option<AuditReport>> {
        let result = sqlx::query("UPDATE audit_reports SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(time::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let report = self.find_by_id(id).await?;
        if let Some(report) = &report {
            self.publish(ChangeOperation::Update, id, Some(report.clone()));
        }
        Ok(report)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM audit_reports")
            .fetch_all(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM audit_reports")
            .execute(&self.pool)
            .await?;

        for id in &ids {
            self.publish(ChangeOperation::Delete, id, None);
        }
        Ok(result.rows_affected())
    }

    fn publish(&self, operation: ChangeOperation, id: &str, report: Option<AuditReport>) {
        self.event_bus
            .emit_lossy(RegwatchEvent::audit_report(operation, id, report));
    }
}

fn report_from_row(row: &SqliteRow) -> Result<AuditReport> {
    let source_ids: String = row.try_get("source_ids")?;
    let original_status: String = row.try_get("original_status")?;
    let status_change_to: String = row.try_get("status_change_to")?;
    let status: String = row.try_get("status")?;

    Ok(AuditReport {
        id: row.try_get("id")?,
        feature_id: row.try_get("feature_id")?,
        source_ids: decode_list(&source_ids)?,
        needs_action: row.try_get("needs_action")?,
        original_status: original_status.parse()?,
        status_change_to: status_change_to.parse()?,
        reason: row.try_get("reason")?,
        confidence: row.try_get("confidence")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
