//! Command Publisher
//!
//! Validates on/off commands and republishes them to the device's command
//! topic as `"<deviceId>@<action>|"`.
//!
//! Publishing is fire-and-forget: the request is handed to the broker
//! client and success is returned immediately. Whatever the device does in
//! response shows up later as an ordinary state message on the attributes
//! topic.

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Device identity commands are addressed to
pub const DEFAULT_DEVICE_ID: &str = "device001";

/// Outbound side of the broker connection
#[async_trait]
pub trait BrokerLink: Send + Sync {
    /// Queue a text payload for publication on `topic`
    async fn publish_text(&self, topic: &str, payload: String) -> Result<(), CommandError>;
}

#[async_trait]
impl BrokerLink for AsyncClient {
    async fn publish_text(&self, topic: &str, payload: String) -> Result<(), CommandError> {
        AsyncClient::publish(self, topic, QoS::AtMostOnce, false, payload.into_bytes())
            .await
            .map_err(|e| CommandError::Connection(e.to_string()))
    }
}

/// Recognized device actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    On,
    Off,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "on",
            Action::Off => "off",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Action::On),
            "off" => Ok(Action::Off),
            other => Err(CommandError::InvalidAction(other.to_string())),
        }
    }
}

/// Errors that can occur while publishing a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid action: {0:?}. Use on or off")]
    InvalidAction(String),

    #[error("Broker connection unavailable: {0}")]
    Connection(String),
}

/// Format the wire payload for a device command
pub fn format_command(device_id: &str, action: Action) -> String {
    format!("{}@{}|", device_id, action)
}

/// Publishes device commands to the broker
pub struct CommandPublisher {
    link: Arc<dyn BrokerLink>,
    topic: String,
    device_id: String,
}

impl CommandPublisher {
    pub fn new(
        link: Arc<dyn BrokerLink>,
        topic: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            link,
            topic: topic.into(),
            device_id: device_id.into(),
        }
    }

    /// Validate and publish a command
    ///
    /// Returns once the broker client has accepted the request; no device
    /// acknowledgement is awaited.
    pub async fn publish_command(&self, action: &str) -> Result<Action, CommandError> {
        let action: Action = action.parse()?;
        let payload = format_command(&self.device_id, action);

        self.link.publish_text(&self.topic, payload.clone()).await?;

        tracing::info!(
            topic = %self.topic,
            payload = %payload,
            "Published device command"
        );
        Ok(action)
    }
}
