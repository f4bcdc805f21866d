//! Compliance analysis endpoints
//!
//! Both answer 503 when no LLM is configured.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyzeSourcesRequest {
    pub source_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeFeatureRequest {
    pub feature_id: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub audit_report_ids: Vec<String>,
}

/// POST /compliance/analyze-sources
pub async fn analyze_sources(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeSourcesRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let audit_report_ids = state.analysis.analyze_sources(&request.source_ids).await?;
    info!(
        "Source analysis over {} source id(s) produced {} report(s)",
        request.source_ids.len(),
        audit_report_ids.len()
    );

    Ok(Json(AnalysisResponse {
        success: true,
        audit_report_ids,
    }))
}

/// POST /compliance/analyze-feature
pub async fn analyze_feature(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeFeatureRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let audit_report_ids = state.analysis.analyze_feature(&request.feature_id).await?;
    Ok(Json(AnalysisResponse {
        success: true,
        audit_report_ids,
    }))
}

pub fn compliance_routes() -> Router<AppState> {
    Router::new()
        .route("/compliance/analyze-sources", post(analyze_sources))
        .route("/compliance/analyze-feature", post(analyze_feature))
}
