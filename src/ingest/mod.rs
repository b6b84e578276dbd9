//! Broker Ingestion
//!
//! Subscribes to the device's MQTT topics and feeds every reading into the
//! metric store, then out to live viewers.
//!
//! ```text
//! broker ──► EventLoop::poll ──► TopicMap::route ──► MetricStore ──► ConnectionHub
//! ```
//!
//! - **topics**: topic → store operation routing
//! - **adapter**: event loop driver and per-message handling
//! - **stats**: counters and link state for health reporting

mod adapter;
mod stats;
mod topics;

pub use adapter::{Backoff, IngestOutcome, IngestionAdapter};
pub use stats::{IngestStats, IngestStatsSnapshot};
pub use topics::{Route, TopicMap};

use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use std::time::Duration;

use crate::config::BrokerConfig;

/// Shortest keep-alive the client accepts without complaint
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Build client options from configuration
pub fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(
        config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
    ));
    options.set_clean_session(true);

    if let Some(username) = &config.username {
        options.set_credentials(username, config.password.clone().unwrap_or_default());
    }

    options
}

/// Create the broker client and its event loop
///
/// Nothing touches the network until the event loop is polled.
pub fn connect(config: &BrokerConfig) -> (AsyncClient, EventLoop) {
    AsyncClient::new(mqtt_options(config), config.request_capacity.max(1))
}

/// Reconnect backoff from configuration
pub fn backoff(config: &BrokerConfig) -> Backoff {
    Backoff::new(
        Duration::from_millis(config.reconnect_initial_ms),
        Duration::from_millis(config.reconnect_max_ms),
    )
}
