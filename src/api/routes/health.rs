//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (broker link is up)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{HealthResponse, SeriesStats};
use crate::api::state::AppState;
use crate::store::MetricKey;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 503 while the broker link is down; snapshots would go stale.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ingest_stats.is_connected() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ingest = state.ingest_stats.snapshot();

    let series = SeriesStats {
        capacity: state.store.capacity(),
        t: state.store.series_len(MetricKey::Temperature).await,
        h: state.store.series_len(MetricKey::Humidity).await,
        p: state.store.series_len(MetricKey::Light).await,
    };

    let (status, broker) = if ingest.connected {
        ("healthy", "connected")
    } else {
        ("degraded", "disconnected")
    };

    Json(HealthResponse {
        status: status.to_string(),
        broker: broker.to_string(),
        viewers: state.ws_connection_count().await,
        series,
        ingest,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
