//! Metric Store
//!
//! Owns the bounded series for every tracked metric and the latest-value
//! snapshot. All state sits behind a single Tokio `RwLock`, so a reader sees
//! either the whole of a write or none of it.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::store::error::{StoreError, StoreResult};
use crate::store::ring::RingBuffer;
use crate::store::types::{DeviceStateSample, LatestSnapshot, MetricKey, MetricSample};

/// Default number of samples kept per series (~30 min at one message per second)
pub const DEFAULT_HISTORY_CAPACITY: usize = 1800;

/// Configuration for the metric store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum samples retained per series
    pub history_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl StoreConfig {
    pub fn new(history_capacity: usize) -> Self {
        Self { history_capacity }
    }
}

impl From<&crate::config::StoreConfig> for StoreConfig {
    fn from(config: &crate::config::StoreConfig) -> Self {
        Self::new(config.history_capacity)
    }
}

/// In-memory metric store
pub struct MetricStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

struct StoreInner {
    /// Indexed by `MetricKey::index`
    series: [RingBuffer<MetricSample>; 3],
    latest: LatestSnapshot,
    /// Highest timestamp issued so far
    last_ts: i64,
}

impl StoreInner {
    /// Clamp `ts` so issued timestamps never go backwards
    fn next_ts(&mut self, ts: i64) -> i64 {
        let ts = ts.max(self.last_ts);
        self.last_ts = ts;
        ts
    }
}

impl MetricStore {
    /// Create an empty store
    pub fn new(config: StoreConfig) -> Self {
        let capacity = config.history_capacity.max(1);

        Self {
            inner: RwLock::new(StoreInner {
                series: [
                    RingBuffer::with_capacity(capacity),
                    RingBuffer::with_capacity(capacity),
                    RingBuffer::with_capacity(capacity),
                ],
                latest: LatestSnapshot::default(),
                last_ts: i64::MIN,
            }),
            capacity,
        }
    }

    /// Record a raw numeric reading at the current time
    ///
    /// Returns the updated snapshot, or `None` when the payload was not a
    /// number. Malformed readings are logged and dropped without touching
    /// any state.
    pub async fn record_metric(&self, key: MetricKey, raw: &str) -> Option<LatestSnapshot> {
        self.record_metric_at(key, raw, Utc::now().timestamp_millis())
            .await
    }

    /// Record a raw numeric reading with an explicit timestamp
    ///
    /// A timestamp older than the last one issued is clamped forward.
    pub async fn record_metric_at(
        &self,
        key: MetricKey,
        raw: &str,
        ts: i64,
    ) -> Option<LatestSnapshot> {
        let value = match parse_reading(key, raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(metric = %key, error = %e, "Discarding malformed reading");
                return None;
            }
        };

        let mut inner = self.inner.write().await;
        let sample = MetricSample::new(inner.next_ts(ts), value);

        inner.series[key.index()].push(sample);
        inner.latest.set(key, sample);

        tracing::trace!(metric = %key, ts = sample.ts, value, "Recorded sample");
        Some(inner.latest.clone())
    }

    /// Record the device on/off state at the current time
    pub async fn record_state(&self, raw: &str) -> LatestSnapshot {
        self.record_state_at(raw, Utc::now().timestamp_millis())
            .await
    }

    /// Record the device state with an explicit timestamp
    pub async fn record_state_at(&self, raw: &str, ts: i64) -> LatestSnapshot {
        let mut inner = self.inner.write().await;
        let ts = inner.next_ts(ts);

        inner.latest.state = Some(DeviceStateSample {
            ts,
            value: raw.trim().to_string(),
        });

        tracing::trace!(ts, state = raw.trim(), "Recorded device state");
        inner.latest.clone()
    }

    /// Get a copy of the latest snapshot
    pub async fn latest(&self) -> LatestSnapshot {
        self.inner.read().await.latest.clone()
    }

    /// Get the full series for a metric, oldest-first
    pub async fn history(&self, key: MetricKey) -> Vec<MetricSample> {
        self.inner.read().await.series[key.index()].to_vec()
    }

    /// Get the full series for a metric given its wire code
    pub async fn history_by_name(&self, name: &str) -> StoreResult<Vec<MetricSample>> {
        let key: MetricKey = name.parse()?;
        Ok(self.history(key).await)
    }

    /// Number of samples currently held for a metric
    pub async fn series_len(&self, key: MetricKey) -> usize {
        self.inner.read().await.series[key.index()].len()
    }

    /// Maximum samples retained per series
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Parse a broker payload as a finite number
fn parse_reading(key: MetricKey, raw: &str) -> StoreResult<f64> {
    let trimmed = raw.trim();

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(StoreError::Parse {
            key: key.to_string(),
            raw: trimmed.to_string(),
        }),
    }
}
