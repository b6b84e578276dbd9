//! Sensorhub CLI
//!
//! Command-line client for a running sensorhub server:
//! - Show the latest readings
//! - Dump a metric's history
//! - Switch the device on or off
//! - Check server health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sensorhub-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the sensorhub telemetry relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:3001", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest reading of every metric and the device state
    Latest,

    /// Show recent history of one metric
    History {
        /// Metric key: t, h or p
        key: String,
        /// Only show the newest N samples
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Send a command to the device
    Cmd {
        /// on or off
        action: String,
    },

    /// Show server health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Latest => {
            let response = send_or_exit(
                client.get(format!("{}/api/metrics/latest", cli.api_url)),
                &cli.api_url,
            )
            .await;
            let latest = expect_success(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&latest)?);
            } else {
                print_latest(&latest);
            }
        }

        Commands::History { key, last } => {
            let response = send_or_exit(
                client.get(format!("{}/api/metrics/history/{}", cli.api_url, key)),
                &cli.api_url,
            )
            .await;
            let data = expect_success(response).await?;

            let samples = data.as_array().cloned().unwrap_or_default();
            let skip = last.map_or(0, |n| samples.len().saturating_sub(n));
            let samples = &samples[skip..];

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(samples)?);
            } else {
                print_history(&key, samples);
            }
        }

        Commands::Cmd { action } => {
            let body = serde_json::json!({ "action": action });
            let response = send_or_exit(
                client
                    .post(format!("{}/api/cmd", cli.api_url))
                    .json(&body),
                &cli.api_url,
            )
            .await;
            let result = expect_success(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Sent {} to device", action);
            }
        }

        Commands::Health => {
            let response = send_or_exit(
                client.get(format!("{}/health", cli.api_url)),
                &cli.api_url,
            )
            .await;
            let health = expect_success(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                print_health(&health);
            }
        }

        Commands::Config { output } => {
            let config = sensorhub::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn send_or_exit(request: reqwest::RequestBuilder, api_url: &str) -> reqwest::Response {
    match request.send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Cannot connect to sensorhub at {}", api_url);
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Make sure the server is running:");
            eprintln!("  cargo run --bin sensorhub");
            std::process::exit(1);
        }
    }
}

/// Parse a successful JSON body, or print the API error and exit
async fn expect_success(
    response: reqwest::Response,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);
        eprintln!("Request failed ({}): {}", status, message);
        std::process::exit(1);
    }

    Ok(response.json().await?)
}

fn print_latest(latest: &serde_json::Value) {
    println!("{:<12} {:<12} {}", "Metric", "Value", "Time");
    println!("{}", "-".repeat(48));

    for (key, label) in [("t", "temperature"), ("h", "humidity"), ("p", "light")] {
        let sample = &latest[key];
        let value = sample["value"]
            .as_f64()
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<12} {:<12} {}", label, value, format_ts(&sample["ts"]));
    }

    let state = &latest["s"];
    println!(
        "{:<12} {:<12} {}",
        "state",
        state["value"].as_str().unwrap_or("-"),
        format_ts(&state["ts"])
    );
}

fn print_history(key: &str, samples: &[serde_json::Value]) {
    if samples.is_empty() {
        println!("No samples for {} yet", key);
        return;
    }

    println!("{:<24} | {}", "Time", key);
    println!("{}", "-".repeat(40));

    for sample in samples {
        let value = sample["value"]
            .as_f64()
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} | {}", format_ts(&sample["ts"]), value);
    }

    println!();
    println!("{} samples", samples.len());
}

fn print_health(health: &serde_json::Value) {
    println!(
        "Sensorhub v{}",
        health["version"].as_str().unwrap_or(env!("CARGO_PKG_VERSION"))
    );
    println!();
    println!("Status: {}", health["status"].as_str().unwrap_or("unknown"));
    println!("Broker: {}", health["broker"].as_str().unwrap_or("unknown"));
    println!("Viewers: {}", health["viewers"].as_u64().unwrap_or(0));

    let series = &health["series"];
    println!();
    println!(
        "History (capacity {}):",
        series["capacity"].as_u64().unwrap_or(0)
    );
    for key in ["t", "h", "p"] {
        println!("  {}: {}", key, series[key].as_u64().unwrap_or(0));
    }

    let ingest = &health["ingest"];
    println!();
    println!("Ingest:");
    for field in ["received", "applied", "discarded", "ignored", "reconnects"] {
        println!("  {}: {}", field, ingest[field].as_u64().unwrap_or(0));
    }

    if let Some(uptime) = health["uptime_seconds"].as_u64() {
        println!();
        println!("Uptime: {}", format_duration(uptime));
    }
}

fn format_ts(ts: &serde_json::Value) -> String {
    ts.as_i64()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
