//! Audit report endpoints and the execute/dismiss/verify actions

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use regwatch_common::models::{AuditReport, AuditReportCreateRequest};
use regwatch_common::sse::relay_feed;
use serde::Serialize;
use std::convert::Infallible;
use tracing::info;

use crate::{error::ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct AuditReportListResponse {
    pub success: bool,
    pub audit_reports: Vec<AuditReport>,
}

/// Single report; `audit_report` is null when a lookup finds nothing
#[derive(Debug, Serialize)]
pub struct AuditReportResponse {
    pub success: bool,
    pub audit_report: Option<AuditReport>,
}

#[derive(Debug, Serialize)]
pub struct AuditReportCreatedResponse {
    pub success: bool,
    pub audit_report_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

pub async fn list_audit_reports(
    State(state): State<AppState>,
) -> ApiResult<Json<AuditReportListResponse>> {
    let audit_reports = state.audit_reports.list().await?;
    Ok(Json(AuditReportListResponse {
        success: true,
        audit_reports,
    }))
}

pub async fn create_audit_report(
    State(state): State<AppState>,
    Json(request): Json<AuditReportCreateRequest>,
) -> ApiResult<Json<AuditReportCreatedResponse>> {
    let report = state.audit_reports.create(&request).await?;
    Ok(Json(AuditReportCreatedResponse {
        success: true,
        audit_report_id: report.id,
    }))
}

pub async fn get_audit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuditReportResponse>> {
    let report = state.audit_reports.get(&id).await?;
    Ok(Json(AuditReportResponse {
        success: true,
        audit_report: Some(report),
    }))
}

/// GET /audit-report/feature/:id/pending
pub async fn pending_for_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<String>,
) -> ApiResult<Json<AuditReportResponse>> {
    let audit_report = state.audit_reports.pending_for_feature(&feature_id).await?;
    Ok(Json(AuditReportResponse {
        success: true,
        audit_report,
    }))
}

/// GET /audit-report/source/:id
pub async fn reports_for_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> ApiResult<Json<AuditReportListResponse>> {
    let audit_reports = state.audit_reports.list_by_source(&source_id).await?;
    Ok(Json(AuditReportListResponse {
        success: true,
        audit_reports,
    }))
}

/// POST /audit-report/:id/action
pub async fn execute_audit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    let report = state.actions.execute(&id).await?;
    info!("Executed audit report {} for feature {}", report.id, report.feature_id);
    Ok(ActionResponse::ok("Audit report action executed successfully"))
}

/// POST /audit-report/:id/dismiss
pub async fn dismiss_audit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    state.actions.dismiss(&id).await?;
    Ok(ActionResponse::ok("Audit report dismissed successfully"))
}

/// POST /audit-report/:id/verify
pub async fn verify_audit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    state.actions.verify(&id).await?;
    Ok(ActionResponse::ok("Audit report verified successfully"))
}

/// GET /audit-report/stream
pub async fn audit_report_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    relay_feed("audit reports", state.audit_reports.stream())
}

pub fn audit_report_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/audit-report",
            get(list_audit_reports).post(create_audit_report),
        )
        .route("/audit-report/stream", get(audit_report_stream))
        .route(
            "/audit-report/feature/:id/pending",
            get(pending_for_feature),
        )
        .route("/audit-report/source/:id", get(reports_for_source))
        .route("/audit-report/:id", get(get_audit_report))
        .route("/audit-report/:id/action", post(execute_audit_report))
        .route("/audit-report/:id/dismiss", post(dismiss_audit_report))
        .route("/audit-report/:id/verify", post(verify_audit_report))
}
