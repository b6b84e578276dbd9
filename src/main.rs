//! Sensorhub Server
//!
//! Run with: cargo run --bin sensorhub
//!
//! # Configuration
//!
//! Reads `--config <path>` or the first config file found in the default
//! locations, then applies environment overrides:
//! - `PORT`: Port to listen on (default: 3001)
//! - `MQTT_HOST`, `MQTT_PORT`: Broker address (default: localhost:1883)
//! - `MQTT_USERNAME`, `MQTT_PASSWORD`: Broker credentials (optional)
//! - `MQTT_TOPIC_ATTRS`, `MQTT_TOPIC_T`, `MQTT_TOPIC_H`, `MQTT_TOPIC_P`, `MQTT_TOPIC_CMD`
//! - `RUST_LOG`: Log filter (default: from `[logging]`)

use anyhow::Context;
use clap::Parser;
use sensorhub::api::{serve, ApiConfig, AppState};
use sensorhub::command::{BrokerLink, CommandPublisher};
use sensorhub::config::{generate_default_config, Config, LoggingConfig};
use sensorhub::ingest::{self, IngestStats, IngestionAdapter, TopicMap};
use sensorhub::store::{MetricStore, StoreConfig};
use sensorhub::websocket::{ConnectionHub, HubConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Time allowed for the DISCONNECT to reach the broker on shutdown
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(name = "sensorhub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relays MQTT sensor telemetry to live dashboards")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let source = args.config.clone().or_else(Config::locate_default);
    let config = match &source {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env(),
    };
    config.validate()?;

    init_tracing(&config.logging);

    tracing::info!("Starting sensorhub v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => tracing::info!(path = %path.display(), "Loaded config file"),
        None => tracing::info!("No config file found, using defaults with environment overrides"),
    }
    tracing::info!(
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        client_id = %config.broker.client_id,
        history_capacity = config.store.history_capacity,
        "Configuration loaded"
    );

    let store = Arc::new(MetricStore::new(StoreConfig::from(&config.store)));
    let hub = Arc::new(ConnectionHub::new(HubConfig::from(&config.hub)));
    let stats = Arc::new(IngestStats::new());

    let (client, eventloop) = ingest::connect(&config.broker);

    let link: Arc<dyn BrokerLink> = Arc::new(client.clone());
    let commands = Arc::new(CommandPublisher::new(
        link,
        &config.topics.command,
        &config.topics.device_id,
    ));

    let adapter = IngestionAdapter::new(
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&stats),
        TopicMap::from(&config.topics),
    )
    .backoff(ingest::backoff(&config.broker));
    let mut ingest_handle = tokio::spawn(adapter.run(client.clone(), eventloop));

    let api_config = ApiConfig::from(&config.api);
    let state = AppState::new(store, hub, commands, stats, api_config.clone());

    let result = serve(state, &api_config).await;

    // Graceful shutdown
    tracing::info!("Disconnecting from MQTT broker...");
    match client.try_disconnect() {
        Ok(()) => {
            // The event loop writes the DISCONNECT and then returns
            if tokio::time::timeout(DISCONNECT_TIMEOUT, &mut ingest_handle)
                .await
                .is_err()
            {
                tracing::warn!(timeout = ?DISCONNECT_TIMEOUT, "Broker disconnect timed out");
                ingest_handle.abort();
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Broker disconnect could not be queued");
            ingest_handle.abort();
        }
    }

    result?;
    tracing::info!("Sensorhub stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sensorhub={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
