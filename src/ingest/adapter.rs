//! Ingestion Adapter
//!
//! Drives the MQTT event loop and turns every routed publish into exactly
//! one store update followed by one broadcast.

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;

use super::stats::IngestStats;
use super::topics::{Route, TopicMap};
use crate::store::MetricStore;
use crate::websocket::{ConnectionHub, ServerMessage};

/// What happened to one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Store updated and viewers notified
    Applied,
    /// Payload was malformed, nothing changed
    Discarded,
    /// Topic is not one we route
    Ignored,
}

/// Exponential reconnect delay
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        let max = max.max(initial);

        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; doubles the following one up to the cap
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Bridges the broker feed to the store and the live hub
pub struct IngestionAdapter {
    store: Arc<MetricStore>,
    hub: Arc<ConnectionHub>,
    stats: Arc<IngestStats>,
    topics: TopicMap,
    backoff: Backoff,
}

impl IngestionAdapter {
    pub fn new(
        store: Arc<MetricStore>,
        hub: Arc<ConnectionHub>,
        stats: Arc<IngestStats>,
        topics: TopicMap,
    ) -> Self {
        Self {
            store,
            hub,
            stats,
            topics,
            backoff: Backoff::default(),
        }
    }

    /// Builder: set the reconnect backoff
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Apply one broker message
    ///
    /// The hub lock is held across the store update and the broadcast so a
    /// viewer registering concurrently sees either both or neither.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) -> IngestOutcome {
        self.stats.record_received();

        let Some(route) = self.topics.route(topic) else {
            tracing::trace!(topic = %topic, "Ignoring message on unrouted topic");
            self.stats.record_ignored();
            return IngestOutcome::Ignored;
        };

        let payload = String::from_utf8_lossy(payload).trim().to_string();

        let mut viewers = self.hub.lock().await;

        let latest = match route {
            Route::Metric(key) => self.store.record_metric(key, &payload).await,
            Route::State => Some(self.store.record_state(&payload).await),
        };

        let Some(latest) = latest else {
            self.stats.record_discarded();
            return IngestOutcome::Discarded;
        };

        let delivered = viewers.broadcast(&ServerMessage::telemetry(topic, payload, latest));
        drop(viewers);

        self.stats.record_applied();
        tracing::debug!(topic = %topic, viewers = delivered, "Applied broker message");
        IngestOutcome::Applied
    }

    /// Run the broker event loop until the client disconnects
    ///
    /// Subscriptions are (re)issued on every ConnAck, since the session is
    /// clean. On transport errors the loop sleeps for the backoff delay and
    /// polls again, which makes the client reconnect. Returns once a
    /// DISCONNECT requested through the client has been written.
    pub async fn run(mut self, client: AsyncClient, mut eventloop: EventLoop) {
        tracing::info!(topics = ?self.topics.subscriptions(), "Starting broker ingestion");

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "Connected to MQTT broker");
                    self.stats.set_connected(true);
                    self.backoff.reset();
                    self.subscribe_all(&client);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.handle_message(&publish.topic, &publish.payload).await;
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    tracing::debug!(pkid = ack.pkid, codes = ?ack.return_codes, "Subscription acknowledged");
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    tracing::warn!("Broker sent disconnect");
                    self.stats.set_connected(false);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    tracing::info!("Disconnected from MQTT broker");
                    self.stats.set_connected(false);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    let was_connected = self.stats.is_connected();
                    self.stats.set_connected(false);
                    if was_connected {
                        self.stats.record_reconnect();
                    }

                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        retry_in = ?delay,
                        "MQTT connection error"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn subscribe_all(&self, client: &AsyncClient) {
        for topic in self.topics.subscriptions() {
            // try_subscribe: awaiting here could stall the loop that drains the queue
            match client.try_subscribe(topic, QoS::AtMostOnce) {
                Ok(()) => tracing::info!(topic = %topic, "Subscribed"),
                Err(e) => tracing::error!(topic = %topic, error = %e, "Failed to subscribe"),
            }
        }
    }
}
