//! Metrics Routes
//!
//! Read-only snapshot and history endpoints.
//!
//! - GET /api/metrics/latest - Latest value per field
//! - GET /api/metrics/history/:key - Series for `t`, `h` or `p`, oldest-first

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::{LatestSnapshot, MetricSample};

/// GET /api/metrics/latest
pub async fn latest(State(state): State<Arc<AppState>>) -> Json<LatestSnapshot> {
    Json(state.store.latest().await)
}

/// GET /api/metrics/history/:key
///
/// Unknown keys are rejected with 400.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<MetricSample>>> {
    let samples = state.store.history_by_name(&key).await?;
    Ok(Json(samples))
}
