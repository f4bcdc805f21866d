//! Feature endpoints
//!
//! GET/POST /features, GET /features/count, GET /features/stream,
//! GET/PUT /features/:id

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
    Json, Router,
};
use futures::Stream;
use regwatch_common::models::{Feature, FeatureCreateRequest, FeatureUpdateRequest};
use regwatch_common::sse::relay_feed;
use serde::Serialize;
use std::convert::Infallible;
use tracing::info;

use crate::{error::ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct FeatureListResponse {
    pub success: bool,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct FeatureResponse {
    pub success: bool,
    pub feature: Feature,
}

/// POST and PUT response
#[derive(Debug, Serialize)]
pub struct FeatureWriteResponse {
    pub success: bool,
    pub message: String,
    pub feature_id: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub success: bool,
    pub count: i64,
}

pub async fn list_features(State(state): State<AppState>) -> ApiResult<Json<FeatureListResponse>> {
    let features = state.features.list().await?;
    Ok(Json(FeatureListResponse {
        success: true,
        features,
    }))
}

/// POST /features
///
/// Tags the feature through the LLM when one is configured.
pub async fn create_feature(
    State(state): State<AppState>,
    Json(request): Json<FeatureCreateRequest>,
) -> ApiResult<Json<FeatureWriteResponse>> {
    let feature = state.features.create(&request).await?;
    info!("Created feature {} ({})", feature.id, feature.name);

    Ok(Json(FeatureWriteResponse {
        success: true,
        message: "Feature created successfully".to_string(),
        feature_id: feature.id,
    }))
}

pub async fn count_features(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = state.features.count().await?;
    Ok(Json(CountResponse {
        success: true,
        count,
    }))
}

pub async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FeatureResponse>> {
    let feature = state.features.get(&id).await?;
    Ok(Json(FeatureResponse {
        success: true,
        feature,
    }))
}

/// PUT /features/:id
///
/// 400 when the body sets no field, 404 when the feature does not exist.
pub async fn update_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FeatureUpdateRequest>,
) -> ApiResult<Json<FeatureWriteResponse>> {
    let feature = state.features.update(&id, &request).await?;
    Ok(Json(FeatureWriteResponse {
        success: true,
        message: "Feature updated successfully".to_string(),
        feature_id: feature.id,
    }))
}

/// GET /features/stream
pub async fn feature_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    relay_feed("features", state.features.stream())
}

pub fn feature_routes() -> Router<AppState> {
    Router::new()
        .route("/features", get(list_features).post(create_feature))
        .route("/features/count", get(count_features))
        .route("/features/stream", get(feature_stream))
        .route("/features/:id", get(get_feature).put(update_feature))
}
