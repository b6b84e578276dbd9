//! WebSocket Connection Hub
//!
//! Registry of live viewer connections and fan-out of telemetry.
//!
//! Every connection owns a bounded mpsc queue drained by its socket writer.
//! The hub only ever `try_send`s into those queues, so a slow or dead viewer
//! never stalls ingestion or other viewers; it is dropped from the registry
//! instead.
//!
//! # Locking
//!
//! The registry sits behind a single Tokio mutex, acquired through
//! [`ConnectionHub::lock`]. Callers that pair a store access with a hub
//! operation hold the guard across both, always taking the hub lock before
//! the store lock:
//!
//! - ingestion: lock hub → update store → broadcast
//! - connect: lock hub → read store snapshot → register (queues hello)
//!
//! This totally orders registrations against store updates, so the hello
//! snapshot a viewer receives is exactly the state preceding the first
//! telemetry message it receives.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::store::MetricStore;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all viewer connections
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Messages that may queue for one connection before it is dropped
    pub send_queue_depth: usize,
    /// Time allowed for a single socket write before the viewer is dropped
    pub send_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            send_queue_depth: 256,
            send_timeout_ms: 5000,
        }
    }
}

impl From<&crate::config::HubConfig> for HubConfig {
    fn from(config: &crate::config::HubConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            send_queue_depth: config.send_queue_depth.max(1),
            send_timeout_ms: config.send_timeout_ms,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Queue drained by the connection's socket writer
    pub sender: mpsc::Sender<ServerMessage>,
    /// When the connection joined
    pub connected_at: DateTime<Utc>,
}

/// Exclusive access to the connection registry
pub struct HubGuard<'a> {
    connections: MutexGuard<'a, HashMap<ConnectionId, ConnectionHandle>>,
    config: &'a HubConfig,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Create the bounded queue for a new connection
    pub fn channel(&self) -> (mpsc::Sender<ServerMessage>, mpsc::Receiver<ServerMessage>) {
        mpsc::channel(self.config.send_queue_depth.max(1))
    }

    /// Acquire the registry
    pub async fn lock(&self) -> HubGuard<'_> {
        HubGuard {
            connections: self.connections.lock().await,
            config: &self.config,
        }
    }

    /// Register a viewer, queueing the current store snapshot as hello
    ///
    /// The snapshot is read while the registry is locked, so no store update
    /// applied through [`HubGuard::broadcast`] can fall between the hello and
    /// the first telemetry message.
    pub async fn register_viewer(
        &self,
        store: &MetricStore,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut viewers = self.lock().await;
        let latest = store.latest().await;
        viewers.register(sender, ServerMessage::hello(latest))
    }

    /// Unregister a connection
    ///
    /// Unknown ids are ignored, so this is safe to call more than once.
    pub async fn unregister(&self, id: &str) {
        self.lock().await.unregister(id);
    }

    /// Broadcast a message to every connection
    pub async fn broadcast(&self, message: &ServerMessage) -> usize {
        self.lock().await.broadcast(message)
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.lock().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .try_send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl HubGuard<'_> {
    /// Register a new connection
    ///
    /// `hello` is queued before the connection becomes visible to
    /// broadcasts, so it is always the first message the viewer gets.
    pub fn register(
        &mut self,
        sender: mpsc::Sender<ServerMessage>,
        hello: ServerMessage,
    ) -> Result<ConnectionId, HubError> {
        if self.connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        sender.try_send(hello).map_err(|_| HubError::SendFailed)?;

        let id = Uuid::new_v4().to_string();
        let handle = ConnectionHandle {
            sender,
            connected_at: Utc::now(),
        };
        self.connections.insert(id.clone(), handle);

        tracing::info!(
            connection_id = %id,
            viewers = self.connections.len(),
            "WebSocket connected"
        );
        Ok(id)
    }

    /// Unregister a connection, returning whether it was present
    pub fn unregister(&mut self, id: &str) -> bool {
        match self.connections.remove(id) {
            Some(handle) => {
                let duration = Utc::now() - handle.connected_at;
                tracing::info!(
                    connection_id = %id,
                    connected_secs = duration.num_seconds(),
                    "WebSocket disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Queue a message on every connection
    ///
    /// Connections whose queue is closed or full are removed. Returns the
    /// number of connections the message was delivered to.
    pub fn broadcast(&mut self, message: &ServerMessage) -> usize {
        let mut delivered = 0;

        self.connections.retain(|id, handle| {
            match handle.sender.try_send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection_id = %id, "Viewer too slow, dropping connection");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %id, "Viewer gone, dropping connection");
                    false
                }
            }
        });

        tracing::trace!(viewers = delivered, "Broadcast event");
        delivered
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
