//! Sensorhub Metric Store
//!
//! Bounded in-memory telemetry history:
//!
//! - **types**: Core data structures (MetricKey, MetricSample, LatestSnapshot)
//! - **ring**: Fixed-capacity circular buffer backing each series
//! - **engine**: The store itself, sole owner of series and snapshot
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use sensorhub::store::{MetricKey, MetricStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MetricStore::new(StoreConfig::new(1800));
//!
//!     store.record_metric(MetricKey::Temperature, "21.5").await;
//!     store.record_state("s|on").await;
//!
//!     let latest = store.latest().await;
//!     assert_eq!(latest.temperature.map(|s| s.value), Some(21.5));
//! }
//! ```

pub mod engine;
pub mod error;
pub mod ring;
pub mod types;

pub use engine::{MetricStore, StoreConfig, DEFAULT_HISTORY_CAPACITY};
pub use error::{StoreError, StoreResult};
pub use ring::RingBuffer;
pub use types::{DeviceStateSample, LatestSnapshot, MetricKey, MetricSample};
