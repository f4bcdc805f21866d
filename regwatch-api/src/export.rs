//! Audit report CSV export
//!
//! One row per audit report in creation order. Each report's sources appear
//! as `source_id_N, source_url_N` column pairs, padded to the report with the
//! most sources. Unknown feature or source ids leave empty cells.

use crate::db::{AuditReportRepository, FeatureRepository, SourceRepository};
use regwatch_common::events::EventBus;
use regwatch_common::models::{AuditReport, Feature, Source};
use regwatch_common::time::format_timestamp;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;
use tracing::info;

const FIXED_COLUMNS: [&str; 11] = [
    "audit_report_id",
    "feature_id",
    "feature_name",
    "needs_action",
    "original_status",
    "status_change_to",
    "reason",
    "confidence",
    "status",
    "created_at",
    "updated_at",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Common(#[from] regwatch_common::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load every audit report with its feature and sources from `pool` and
/// write them to `writer`; returns the number of rows written
pub async fn export_audit_reports<W: Write>(
    pool: &SqlitePool,
    writer: W,
) -> Result<usize, ExportError> {
    // Read-only: nothing subscribes to this bus
    let event_bus = EventBus::new(1);
    let reports = AuditReportRepository::new(pool.clone(), event_bus.clone())
        .list_all()
        .await?;
    let features = FeatureRepository::new(pool.clone(), event_bus.clone())
        .list_all()
        .await?;
    let sources = SourceRepository::new(pool.clone(), event_bus)
        .list_all()
        .await?;

    info!(
        "Exporting {} audit report(s) ({} features, {} sources known)",
        reports.len(),
        features.len(),
        sources.len()
    );
    write_audit_reports_csv(&reports, &features, &sources, writer)
}

/// Write `reports` as CSV, resolving feature names and source URLs by id
pub fn write_audit_reports_csv<W: Write>(
    reports: &[AuditReport],
    features: &[Feature],
    sources: &[Source],
    writer: W,
) -> Result<usize, ExportError> {
    let feature_names: HashMap<&str, &str> = features
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect();
    let source_urls: HashMap<&str, &str> = sources
        .iter()
        .map(|s| (s.id.as_str(), s.source_url.as_str()))
        .collect();
    let source_columns = reports
        .iter()
        .map(|r| r.source_ids.len())
        .max()
        .unwrap_or(0);

    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for i in 1..=source_columns {
        header.push(format!("source_id_{}", i));
        header.push(format!("source_url_{}", i));
    }
    out.write_record(&header)?;

    for report in reports {
        let mut row = vec![
            report.id.clone(),
            report.feature_id.clone(),
            feature_names
                .get(report.feature_id.as_str())
                .copied()
                .unwrap_or_default()
                .to_string(),
            report.needs_action.to_string(),
            report.original_status.to_string(),
            report.status_change_to.to_string(),
            report.reason.clone(),
            report.confidence.to_string(),
            report.status.to_string(),
            format_timestamp(&report.created_at),
            report
                .updated_at
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_default(),
        ];
        for i in 0..source_columns {
            match report.source_ids.get(i) {
                Some(id) => {
                    row.push(id.clone());
                    row.push(
                        source_urls
                            .get(id.as_str())
                            .copied()
                            .unwrap_or_default()
                            .to_string(),
                    );
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(reports.len())
}
