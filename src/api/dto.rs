//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. Snapshot and history
//! bodies are the store types themselves (`LatestSnapshot`, `MetricSample`),
//! which already serialize in the dashboard's wire shape.

use serde::{Deserialize, Serialize};

use crate::ingest::IngestStatsSnapshot;

// ============================================
// COMMAND DTOs
// ============================================

/// Device command request
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    /// "on" or "off"
    #[serde(default)]
    pub action: Option<String>,
}

/// Device command response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandResponse {
    pub ok: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Broker link: "connected" or "disconnected"
    pub broker: String,
    /// Open WebSocket viewers
    pub viewers: usize,
    /// Samples held per series
    pub series: SeriesStats,
    /// Ingestion counters
    pub ingest: IngestStatsSnapshot,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Version string
    pub version: String,
}

/// Series fill levels
#[derive(Debug, Serialize)]
pub struct SeriesStats {
    pub capacity: usize,
    pub t: usize,
    pub h: usize,
    pub p: usize,
}
