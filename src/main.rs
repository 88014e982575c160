//! Attribution Engine
//!
//! Batch pipeline resolving anonymous clickstream events into stitched
//! identities, behavioral sessions, and first/last-click revenue
//! attribution:
//! - Normalization (traffic + device classification, payload parsing)
//! - Retroactive identity stitching
//! - 30-minute gap sessionization
//! - 7-day lookback attribution and order-line expansion
//! - Atomic replacement of the four derived tables

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};

use pipeline::EngineConfig;
use telemetry::{init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Accepted-event NDJSON input file
    #[serde(default = "default_input")]
    input: String,

    /// Directory receiving the tables/ output
    #[serde(default = "default_output_dir")]
    output_dir: String,
}

fn default_input() -> String {
    "data/accepted_events.ndjson".to_string()
}

fn default_output_dir() -> String {
    "data/processed".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting Attribution Engine v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // A failed run leaves the previous tables untouched.
            error!("Run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = load_config()?;
    info!(input = %config.input, output_dir = %config.output_dir, "Loaded configuration");

    let engine_config = EngineConfig {
        input: PathBuf::from(&config.input),
        output_dir: PathBuf::from(&config.output_dir),
    };

    let outcome = pipeline::run(&engine_config)
        .await
        .context("Engine run failed")?;

    info!(
        events = outcome.summary.events,
        sessions = outcome.summary.sessions,
        purchases = outcome.summary.purchases,
        "Engine run finished"
    );

    let snapshot = metrics().snapshot();
    info!(
        events_read = snapshot.events_read,
        sessions_built = snapshot.sessions_built,
        purchases_attributed = snapshot.purchases_attributed,
        purchases_unattributed = snapshot.purchases_unattributed,
        revenue_mismatches = snapshot.revenue_mismatches,
        "Final metrics"
    );

    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ENGINE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat env overrides; the config crate's nested parsing is
    // unreliable with underscored field names.
    if let Ok(input) = std::env::var("ENGINE_INPUT") {
        config.input = input;
    }
    if let Ok(output_dir) = std::env::var("ENGINE_OUTPUT_DIR") {
        config.output_dir = output_dir;
    }

    Ok(config)
}
