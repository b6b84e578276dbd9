//! Ingestion counters and broker link state, read by the health endpoint.

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Lock-free ingestion statistics
#[derive(Debug, Default)]
pub struct IngestStats {
    connected: AtomicBool,
    received: AtomicU64,
    applied: AtomicU64,
    discarded: AtomicU64,
    ignored: AtomicU64,
    reconnects: AtomicU64,
    /// Unix ms of the last applied message, 0 when none
    last_message_ms: AtomicI64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngestStatsSnapshot {
    pub connected: bool,
    pub received: u64,
    pub applied: u64,
    pub discarded: u64,
    pub ignored: u64,
    pub reconnects: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_ms: Option<i64>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        self.last_message_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestStatsSnapshot {
        let last = self.last_message_ms.load(Ordering::Relaxed);

        IngestStatsSnapshot {
            connected: self.is_connected(),
            received: self.received.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            last_message_ms: (last > 0).then_some(last),
        }
    }
}
