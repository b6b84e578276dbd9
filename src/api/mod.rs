//! Sensorhub REST API
//!
//! HTTP API layer for sensorhub, built with Axum.
//!
//! # Endpoints
//!
//! ## Metrics
//! - `GET /api/metrics/latest` - Latest snapshot `{t, h, p, s}`
//! - `GET /api/metrics/history/:key` - History for `t`, `h` or `p`
//!
//! ## Commands
//! - `POST /api/cmd` - Switch the device `{"action": "on" | "off"}`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Live telemetry stream
//!
//! # Example
//!
//! ```rust,ignore
//! use sensorhub::api::{serve, ApiConfig, AppState};
//!
//! let state = AppState::new(store, hub, commands, ingest_stats, ApiConfig::default());
//! serve(state, &ApiConfig::default()).await?;
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/metrics/latest", get(routes::metrics::latest))
        .route("/metrics/history/:key", get(routes::metrics::history))
        .route("/cmd", post(routes::command::send_command));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Sensorhub API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Sensorhub API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BrokerLink, CommandError, CommandPublisher};
    use crate::ingest::IngestStats;
    use crate::store::{MetricKey, MetricStore, StoreConfig};
    use crate::websocket::ConnectionHub;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    #[derive(Default)]
    struct RecordingLink {
        published: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BrokerLink for RecordingLink {
        async fn publish_text(&self, _topic: &str, payload: String) -> Result<(), CommandError> {
            self.published.lock().unwrap().push(payload);
            Ok(())
        }
    }

    struct TestApp {
        router: Router,
        store: Arc<MetricStore>,
        link: Arc<RecordingLink>,
        stats: Arc<IngestStats>,
    }

    fn create_test_app() -> TestApp {
        let store = Arc::new(MetricStore::new(StoreConfig::new(5)));
        let hub = Arc::new(ConnectionHub::default());
        let link = Arc::new(RecordingLink::default());
        let commands = Arc::new(CommandPublisher::new(
            Arc::clone(&link) as Arc<dyn BrokerLink>,
            "/TEF/device001/cmd",
            "device001",
        ));
        let stats = Arc::new(IngestStats::new());

        let state = AppState::new(
            Arc::clone(&store),
            hub,
            commands,
            Arc::clone(&stats),
            ApiConfig::default(),
        );

        TestApp {
            router: build_router(state),
            store,
            link,
            stats,
        }
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = get(app.router, "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_follows_broker_link() {
        let app = create_test_app();

        let response = get(app.router.clone(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        app.stats.set_connected(true);
        let response = get(app.router, "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        app.store
            .record_metric_at(MetricKey::Humidity, "40", 1)
            .await;

        let response = get(app.router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["broker"], "disconnected");
        assert_eq!(json["viewers"], 0);
        assert_eq!(json["series"]["capacity"], 5);
        assert_eq!(json["series"]["h"], 1);
    }

    #[tokio::test]
    async fn test_latest_empty() {
        let app = create_test_app();

        let response = get(app.router, "/api/metrics/latest").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"t": null, "h": null, "p": null, "s": null})
        );
    }

    #[tokio::test]
    async fn test_latest_after_ingest() {
        let app = create_test_app();
        app.store
            .record_metric_at(MetricKey::Temperature, "21.5", 100)
            .await;
        app.store.record_state_at("s|on", 101).await;

        let json = json_body(get(app.router, "/api/metrics/latest").await).await;
        assert_eq!(json["t"], serde_json::json!({"ts": 100, "value": 21.5}));
        assert_eq!(json["s"], serde_json::json!({"ts": 101, "value": "s|on"}));
        assert!(json["p"].is_null());
    }

    #[tokio::test]
    async fn test_history_oldest_first() {
        let app = create_test_app();
        for (ts, raw) in [(1, "10"), (2, "11"), (3, "12")] {
            app.store.record_metric_at(MetricKey::Light, raw, ts).await;
        }

        let response = get(app.router, "/api/metrics/history/p").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!([
                {"ts": 1, "value": 10.0},
                {"ts": 2, "value": 11.0},
                {"ts": 3, "value": 12.0}
            ])
        );
    }

    #[tokio::test]
    async fn test_history_empty_series() {
        let app = create_test_app();
        let response = get(app.router, "/api/metrics/history/t").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_history_invalid_key() {
        let app = create_test_app();

        let response = get(app.router, "/api/metrics/history/x").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "INVALID_KEY");
        assert!(json["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_history_rejects_long_names() {
        let app = create_test_app();
        app.store
            .record_metric_at(MetricKey::Temperature, "21.5", 1)
            .await;

        for uri in [
            "/api/metrics/history/temperature",
            "/api/metrics/history/humidity",
            "/api/metrics/history/light",
        ] {
            let response = get(app.router.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
            assert_eq!(json_body(response).await["error"]["code"], "INVALID_KEY");
        }
    }

    #[tokio::test]
    async fn test_command_on() {
        let app = create_test_app();

        let response = post_json(app.router, "/api/cmd", r#"{"action": "on"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({"ok": true}));
        assert_eq!(
            *app.link.published.lock().unwrap(),
            vec!["device001@on|".to_string()]
        );
    }

    #[tokio::test]
    async fn test_command_invalid_action() {
        let app = create_test_app();

        let response = post_json(app.router, "/api/cmd", r#"{"action": "toggle"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_ACTION");
        assert!(app.link.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_command_padded_action_rejected() {
        let bodies = [
            r#"{"action": " on "}"#,
            r#"{"action": "off\n"}"#,
            r#"{"action": "ON"}"#,
        ];
        for body in bodies {
            let app = create_test_app();
            let response = post_json(app.router, "/api/cmd", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json_body(response).await["error"]["code"], "INVALID_ACTION");
            assert!(app.link.published.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_command_missing_or_malformed() {
        for body in ["{}", "not json", r#"{"action": 1}"#] {
            let app = create_test_app();
            let response = post_json(app.router, "/api/cmd", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(app.link.published.lock().unwrap().is_empty());
        }
    }
}
