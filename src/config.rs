//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides. The
//! broker variables keep the names the device deployment already uses
//! (`MQTT_HOST`, `MQTT_TOPIC_T`, ...).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::DEFAULT_HISTORY_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub topics: TopicsConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MQTT broker connection
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_host")]
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    pub username: Option<String>,

    pub password: Option<String>,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Capacity of the client request queue
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,

    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("sensorhub-{}", &id[..8])
}

fn default_keep_alive() -> u64 {
    60
}

fn default_request_capacity() -> usize {
    64
}

fn default_reconnect_initial() -> u64 {
    1000
}

fn default_reconnect_max() -> u64 {
    30_000
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            username: None,
            password: None,
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
            request_capacity: default_request_capacity(),
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
        }
    }
}

/// Device topics and identity
#[derive(Debug, Clone, Deserialize)]
pub struct TopicsConfig {
    #[serde(default = "default_attrs_topic")]
    pub attrs: String,

    #[serde(default = "default_temperature_topic")]
    pub temperature: String,

    #[serde(default = "default_humidity_topic")]
    pub humidity: String,

    #[serde(default = "default_light_topic")]
    pub light: String,

    #[serde(default = "default_command_topic")]
    pub command: String,

    #[serde(default = "default_device_id")]
    pub device_id: String,
}

fn default_attrs_topic() -> String {
    "/TEF/device001/attrs".to_string()
}

fn default_temperature_topic() -> String {
    "/TEF/device001/attrs/t".to_string()
}

fn default_humidity_topic() -> String {
    "/TEF/device001/attrs/h".to_string()
}

fn default_light_topic() -> String {
    "/TEF/device001/attrs/p".to_string()
}

fn default_command_topic() -> String {
    "/TEF/device001/cmd".to_string()
}

fn default_device_id() -> String {
    crate::command::DEFAULT_DEVICE_ID.to_string()
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            attrs: default_attrs_topic(),
            temperature: default_temperature_topic(),
            humidity: default_humidity_topic(),
            light: default_light_topic(),
            command: default_command_topic(),
            device_id: default_device_id(),
        }
    }
}

/// Metric store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

/// Live viewer hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_send_queue_depth")]
    pub send_queue_depth: usize,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_send_queue_depth() -> usize {
    256
}

fn default_send_timeout() -> u64 {
    5000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            send_queue_depth: default_send_queue_depth(),
            send_timeout_ms: default_send_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// First config file present in the default locations
    pub fn locate_default() -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("sensorhub").join("config.toml")),
            Some(PathBuf::from("/etc/sensorhub/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        first_existing(&candidates)
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // API overrides
        if let Some(host) = lookup("SENSORHUB_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Broker overrides
        if let Some(host) = lookup("MQTT_HOST") {
            self.broker.host = host;
        }
        if let Some(port) = lookup("MQTT_PORT").and_then(|p| p.parse().ok()) {
            self.broker.port = port;
        }
        if let Some(username) = lookup("MQTT_USERNAME").filter(|s| !s.is_empty()) {
            self.broker.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD").filter(|s| !s.is_empty()) {
            self.broker.password = Some(password);
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            self.broker.client_id = client_id;
        }

        // Topic overrides
        if let Some(topic) = lookup("MQTT_TOPIC_ATTRS") {
            self.topics.attrs = topic;
        }
        if let Some(topic) = lookup("MQTT_TOPIC_T") {
            self.topics.temperature = topic;
        }
        if let Some(topic) = lookup("MQTT_TOPIC_H") {
            self.topics.humidity = topic;
        }
        if let Some(topic) = lookup("MQTT_TOPIC_P") {
            self.topics.light = topic;
        }
        if let Some(topic) = lookup("MQTT_TOPIC_CMD") {
            self.topics.command = topic;
        }
        if let Some(device_id) = lookup("SENSORHUB_DEVICE_ID") {
            self.topics.device_id = device_id;
        }

        // Store overrides
        if let Some(capacity) = lookup("SENSORHUB_HISTORY_CAPACITY").and_then(|c| c.parse().ok()) {
            self.store.history_capacity = capacity;
        }

        // Logging overrides
        if let Some(level) = lookup("SENSORHUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SENSORHUB_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check values that would make the service misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "store.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.hub.send_queue_depth == 0 {
            return Err(ConfigError::Invalid(
                "hub.send_queue_depth must be at least 1".to_string(),
            ));
        }
        if self.broker.request_capacity == 0 {
            return Err(ConfigError::Invalid(
                "broker.request_capacity must be at least 1".to_string(),
            ));
        }

        let topics = [
            ("topics.attrs", &self.topics.attrs),
            ("topics.temperature", &self.topics.temperature),
            ("topics.humidity", &self.topics.humidity),
            ("topics.light", &self.topics.light),
            ("topics.command", &self.topics.command),
            ("topics.device_id", &self.topics.device_id),
        ];
        for (name, value) in topics {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", name)));
            }
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be pretty or json, got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.exists()).cloned()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sensorhub Configuration
#
# Environment variables override these settings:
# - PORT, SENSORHUB_API_HOST
# - MQTT_HOST, MQTT_PORT, MQTT_USERNAME, MQTT_PASSWORD, MQTT_CLIENT_ID
# - MQTT_TOPIC_ATTRS, MQTT_TOPIC_T, MQTT_TOPIC_H, MQTT_TOPIC_P, MQTT_TOPIC_CMD
# - SENSORHUB_DEVICE_ID, SENSORHUB_HISTORY_CAPACITY
# - SENSORHUB_LOG_LEVEL, SENSORHUB_LOG_FORMAT

[broker]
# MQTT broker host and port
host = "localhost"
port = 1883

# Optional credentials
# username = ""
# password = ""

# Client identifier (random when omitted)
# client_id = "sensorhub"

# Keep-alive interval (seconds)
keep_alive_secs = 60

# Outgoing request queue size
request_capacity = 64

# Reconnect backoff (ms), doubled after each failure up to the maximum
reconnect_initial_ms = 1000
reconnect_max_ms = 30000

[topics]
attrs = "/TEF/device001/attrs"
temperature = "/TEF/device001/attrs/t"
humidity = "/TEF/device001/attrs/h"
light = "/TEF/device001/attrs/p"
command = "/TEF/device001/cmd"
device_id = "device001"

[store]
# Samples kept per metric (~30 min at one message per second)
history_capacity = 1800

[hub]
# Maximum concurrent WebSocket viewers
max_connections = 1000

# Messages queued per viewer before it is considered too slow
send_queue_depth = 256

# Socket write timeout (ms)
send_timeout_ms = 5000

[api]
host = "0.0.0.0"
port = 3001

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 1883);
        assert!(config.broker.client_id.starts_with("sensorhub-"));
        assert_eq!(config.topics.temperature, "/TEF/device001/attrs/t");
        assert_eq!(config.topics.command, "/TEF/device001/cmd");
        assert_eq!(config.store.history_capacity, 1800);
        assert_eq!(config.api.port, 3001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.topics.attrs, "/TEF/device001/attrs");
        assert_eq!(config.hub.send_queue_depth, 256);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse(
            r#"
            [broker]
            host = "broker.local"

            [store]
            history_capacity = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.store.history_capacity, 60);
        assert_eq!(config.topics.light, "/TEF/device001/attrs/p");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = 8080").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_first_existing_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("config.toml");
        std::fs::write(&present, "[api]\nport = 8080\n").unwrap();

        assert_eq!(
            first_existing(&[missing.clone(), present.clone()]),
            Some(present)
        );
        assert_eq!(first_existing(&[missing]), None);
        assert_eq!(first_existing(&[]), None);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/sensorhub.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "4000"),
            ("MQTT_HOST", "10.0.0.5"),
            ("MQTT_PORT", "not-a-port"),
            ("MQTT_USERNAME", "fiware"),
            ("MQTT_PASSWORD", ""),
            ("MQTT_TOPIC_T", "/TEF/lamp002/attrs/t"),
            ("SENSORHUB_HISTORY_CAPACITY", "10"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.port, 4000);
        assert_eq!(config.broker.host, "10.0.0.5");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.username.as_deref(), Some("fiware"));
        assert_eq!(config.broker.password, None);
        assert_eq!(config.topics.temperature, "/TEF/lamp002/attrs/t");
        assert_eq!(config.store.history_capacity, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.store.history_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.topics.command = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
