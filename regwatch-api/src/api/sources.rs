//! Source and knowledge-base endpoints

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use futures::Stream;
use regwatch_common::models::{
    Source, SourceContent, SourceContentCreateRequest, SourceContentUpdate, SourceCreateRequest,
    SourceIdsRequest,
};
use regwatch_common::sse::relay_feed;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::info;

use crate::api::features::CountResponse;
use crate::services::{RefreshFailure, RefreshOutcome};
use crate::{error::ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct SourceListResponse {
    pub success: bool,
    pub sources: Vec<Source>,
}

#[derive(Debug, Serialize)]
pub struct SourceCreatedResponse {
    pub success: bool,
    pub source_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct SourceContentQuery {
    pub source_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SourceContentListResponse {
    pub success: bool,
    pub source_contents: Vec<SourceContent>,
}

#[derive(Debug, Serialize)]
pub struct SourceContentCreatedResponse {
    pub success: bool,
    pub source_content_id: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub updated: Vec<SourceContentUpdate>,
    pub failed: Vec<RefreshFailure>,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        Self {
            success: true,
            updated: outcome.updated,
            failed: outcome.failed,
        }
    }
}

pub async fn list_sources(State(state): State<AppState>) -> ApiResult<Json<SourceListResponse>> {
    let sources = state.sources.list().await?;
    Ok(Json(SourceListResponse {
        success: true,
        sources,
    }))
}

/// POST /sources
///
/// 400 unless the URL is absolute http(s).
pub async fn create_source(
    State(state): State<AppState>,
    Json(request): Json<SourceCreateRequest>,
) -> ApiResult<Json<SourceCreatedResponse>> {
    let source = state.sources.create(&request).await?;
    info!("Registered source {} ({})", source.id, source.source_url);

    Ok(Json(SourceCreatedResponse {
        success: true,
        source_id: source.id,
    }))
}

/// POST /sources/ids
pub async fn sources_by_ids(
    State(state): State<AppState>,
    Json(request): Json<SourceIdsRequest>,
) -> ApiResult<Json<SourceListResponse>> {
    let sources = state.sources.list_by_ids(&request.source_ids).await?;
    Ok(Json(SourceListResponse {
        success: true,
        sources,
    }))
}

pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.sources.delete(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn count_sources(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = state.sources.count().await?;
    Ok(Json(CountResponse {
        success: true,
        count,
    }))
}

/// GET /sources/content?source_url=
pub async fn list_source_contents(
    State(state): State<AppState>,
    Query(query): Query<SourceContentQuery>,
) -> ApiResult<Json<SourceContentListResponse>> {
    let source_contents = state
        .source_contents
        .list(query.source_url.as_deref())
        .await?;
    Ok(Json(SourceContentListResponse {
        success: true,
        source_contents,
    }))
}

pub async fn create_source_content(
    State(state): State<AppState>,
    Json(request): Json<SourceContentCreateRequest>,
) -> ApiResult<Json<SourceContentCreatedResponse>> {
    let content = state.source_contents.create(&request).await?;
    Ok(Json(SourceContentCreatedResponse {
        success: true,
        source_content_id: content.id,
    }))
}

/// POST /sources/refresh
///
/// Per-source fetch failures are reported in `failed`, not as an error status.
pub async fn refresh_sources(
    State(state): State<AppState>,
    Json(request): Json<SourceIdsRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.knowledge_base.refresh(&request.source_ids).await?;
    Ok(Json(outcome.into()))
}

pub async fn refresh_all_sources(
    State(state): State<AppState>,
) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.knowledge_base.refresh_all().await?;
    Ok(Json(outcome.into()))
}

/// GET /sources/stream
pub async fn source_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    relay_feed("sources", state.sources.stream())
}

pub fn source_routes() -> Router<AppState> {
    Router::new()
        .route("/sources", get(list_sources).post(create_source))
        .route("/sources/ids", post(sources_by_ids))
        .route("/sources/count", get(count_sources))
        .route(
            "/sources/content",
            get(list_source_contents).post(create_source_content),
        )
        .route("/sources/refresh", post(refresh_sources))
        .route("/sources/refresh-all", post(refresh_all_sources))
        .route("/sources/stream", get(source_stream))
        .route("/sources/:id", delete(delete_source))
}
