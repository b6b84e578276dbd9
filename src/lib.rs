//! # Sensorhub
//!
//! Sensor telemetry relay. Subscribes to a device's MQTT topics, keeps the
//! latest reading and a bounded history per metric in memory, and streams
//! every update to connected dashboards over WebSocket.
//!
//! ## Features
//!
//! - **Bounded history**: One fixed-capacity ring buffer per metric
//! - **Live streaming**: Snapshot on connect, then every update in order
//! - **Device commands**: `on`/`off` published back to the broker
//! - **Resilient ingestion**: Reconnects with backoff, bad payloads are dropped
//!
//! ## Modules
//!
//! - [`store`]: Latest snapshot and per-metric history
//! - [`ingest`]: Broker subscription and message routing
//! - [`websocket`]: Live viewer registry and fan-out
//! - [`command`]: Outbound device commands
//! - [`api`]: REST API server with Axum
//! - [`config`]: File and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensorhub::store::{MetricKey, MetricStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MetricStore::new(StoreConfig::default());
//!
//!     store.record_metric(MetricKey::Humidity, "60").await;
//!
//!     let history = store.history(MetricKey::Humidity).await;
//!     println!("{} humidity samples", history.len());
//! }
//! ```

pub mod api;
pub mod command;
pub mod config;
pub mod ingest;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use store::{
    DeviceStateSample, LatestSnapshot, MetricKey, MetricSample, MetricStore, RingBuffer,
    StoreConfig, StoreError, StoreResult,
};

pub use ingest::{IngestOutcome, IngestStats, IngestionAdapter, Route, TopicMap};

pub use command::{Action, BrokerLink, CommandError, CommandPublisher};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage,
};

pub use config::{Config, ConfigError, LoggingConfig};
