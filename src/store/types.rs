//! Core data types for the metric store
//!
//! - `MetricKey`: the three tracked numeric series
//! - `MetricSample`: one numeric reading
//! - `DeviceStateSample`: the latest on/off token
//! - `LatestSnapshot`: most recent value per field

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::StoreError;

/// A tracked numeric metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    /// Temperature, wire code `t`
    Temperature,
    /// Relative humidity, wire code `h`
    Humidity,
    /// Luminosity, wire code `p`
    Light,
}

impl MetricKey {
    /// Get all keys for iteration
    pub fn all() -> &'static [MetricKey] {
        &[MetricKey::Temperature, MetricKey::Humidity, MetricKey::Light]
    }

    /// Short code used on the wire and in snapshot JSON
    pub fn code(&self) -> &'static str {
        match self {
            MetricKey::Temperature => "t",
            MetricKey::Humidity => "h",
            MetricKey::Light => "p",
        }
    }

    /// Slot of this key in per-series arrays
    pub(crate) fn index(&self) -> usize {
        match self {
            MetricKey::Temperature => 0,
            MetricKey::Humidity => 1,
            MetricKey::Light => 2,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::Temperature => write!(f, "temperature"),
            MetricKey::Humidity => write!(f, "humidity"),
            MetricKey::Light => write!(f, "light"),
        }
    }
}

impl FromStr for MetricKey {
    type Err = StoreError;

    /// Accepts only the wire codes `t`, `h` and `p`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::all()
            .iter()
            .copied()
            .find(|key| key.code() == s)
            .ok_or_else(|| StoreError::InvalidKey(s.to_string()))
    }
}

/// A single numeric reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    /// Unix timestamp in milliseconds
    pub ts: i64,
    /// Measured value
    pub value: f64,
}

impl MetricSample {
    pub fn new(ts: i64, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Latest device on/off state, kept verbatim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceStateSample {
    /// Unix timestamp in milliseconds
    pub ts: i64,
    /// Opaque state token as published by the device
    pub value: String,
}

/// Most recent sample for every field
///
/// Serializes with the short keys the dashboard expects:
/// `{"t": .., "h": .., "p": .., "s": ..}`, absent fields as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LatestSnapshot {
    #[serde(rename = "t")]
    pub temperature: Option<MetricSample>,
    #[serde(rename = "h")]
    pub humidity: Option<MetricSample>,
    #[serde(rename = "p")]
    pub light: Option<MetricSample>,
    #[serde(rename = "s")]
    pub state: Option<DeviceStateSample>,
}

impl LatestSnapshot {
    pub(crate) fn set(&mut self, key: MetricKey, sample: MetricSample) {
        let slot = match key {
            MetricKey::Temperature => &mut self.temperature,
            MetricKey::Humidity => &mut self.humidity,
            MetricKey::Light => &mut self.light,
        };
        *slot = Some(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_parse() {
        assert_eq!("t".parse::<MetricKey>(), Ok(MetricKey::Temperature));
        assert_eq!("h".parse::<MetricKey>(), Ok(MetricKey::Humidity));
        assert_eq!("p".parse::<MetricKey>(), Ok(MetricKey::Light));
        assert_eq!(
            "x".parse::<MetricKey>(),
            Err(StoreError::InvalidKey("x".to_string()))
        );
        for long_name in ["temperature", "humidity", "light"] {
            assert_eq!(
                long_name.parse::<MetricKey>(),
                Err(StoreError::InvalidKey(long_name.to_string()))
            );
        }
        assert!("T".parse::<MetricKey>().is_err());
        assert!(" t".parse::<MetricKey>().is_err());
        assert!("".parse::<MetricKey>().is_err());
    }

    #[test]
    fn test_empty_snapshot_serializes_nulls() {
        let json = serde_json::to_value(LatestSnapshot::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"t": null, "h": null, "p": null, "s": null})
        );
    }

    #[test]
    fn test_snapshot_serialize_short_keys() {
        let mut snapshot = LatestSnapshot::default();
        snapshot.set(MetricKey::Temperature, MetricSample::new(100, 21.5));
        snapshot.state = Some(DeviceStateSample {
            ts: 110,
            value: "s|on".to_string(),
        });

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["t"]["ts"], 100);
        assert_eq!(json["t"]["value"], 21.5);
        assert!(json["h"].is_null());
        assert_eq!(json["s"]["value"], "s|on");
        assert_ne!(snapshot, LatestSnapshot::default());
    }
}
