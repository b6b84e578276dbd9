//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! viewers (dashboards) and the sensorhub server.

use serde::{Deserialize, Serialize};

use crate::store::LatestSnapshot;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Initial snapshot, always the first message on a connection
    Hello {
        /// Store state at the moment the connection joined
        latest: LatestSnapshot,
    },
    /// A broker message was applied to the store
    Telemetry {
        /// Broker topic the message arrived on
        topic: String,
        /// Payload as received (trimmed)
        payload: String,
        /// Snapshot right after applying this message
        latest: LatestSnapshot,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl ServerMessage {
    pub fn hello(latest: LatestSnapshot) -> Self {
        ServerMessage::Hello { latest }
    }

    pub fn telemetry(
        topic: impl Into<String>,
        payload: impl Into<String>,
        latest: LatestSnapshot,
    ) -> Self {
        ServerMessage::Telemetry {
            topic: topic.into(),
            payload: payload.into(),
            latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricSample;

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_client_message_rejects_unknown() {
        let json = r#"{"type": "subscribe", "topics": ["t"]}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_server_message_serialize_hello() {
        let msg = ServerMessage::hello(LatestSnapshot::default());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "hello",
                "latest": {"t": null, "h": null, "p": null, "s": null}
            })
        );
    }

    #[test]
    fn test_server_message_serialize_telemetry() {
        let latest = LatestSnapshot {
            temperature: Some(MetricSample::new(1699000000000, 21.5)),
            ..Default::default()
        };
        let msg = ServerMessage::telemetry("/TEF/device001/attrs/t", "21.5", latest);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "telemetry");
        assert_eq!(json["topic"], "/TEF/device001/attrs/t");
        assert_eq!(json["payload"], "21.5");
        assert_eq!(json["latest"]["t"]["ts"], 1699000000000i64);
        assert_eq!(json["latest"]["t"]["value"], 21.5);
    }

    #[test]
    fn test_server_message_serialize_pong() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
