//! Maintenance scripts

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::services::ResetSummary;
use crate::{error::ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub summary: ResetSummary,
}

/// POST /scripts/reset
///
/// Drops audit reports, source contents and sources; features stay but go
/// back to `pending`.
pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<ResetResponse>> {
    let summary = state.reset.reset().await?;
    Ok(Json(ResetResponse {
        success: true,
        message: "Reset completed".to_string(),
        summary,
    }))
}

pub fn script_routes() -> Router<AppState> {
    Router::new().route("/scripts/reset", post(reset))
}
