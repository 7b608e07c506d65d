//! Sensor reporter discovery CLI
//!
//! Loads a sensor configuration and publishes Home Assistant discovery
//! messages for its sensors.

use anyhow::{Context, Result};
use clap::Parser;
use ha_config::{load_sensor_config, SensorConfig};
use ha_discovery::publish_discovery;
use ha_reporter::{build_sections, LineFormat, StreamPublisher};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Announce configured sensors through Home Assistant MQTT discovery.
#[derive(Parser, Debug)]
#[command(name = "sensor-reporter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sensor configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Only announce these sections (repeatable).
    #[arg(short, long)]
    section: Vec<String>,

    /// Log filter, overrides RUST_LOG and the Logging section.
    #[arg(long)]
    log_level: Option<String>,

    /// Print messages as JSON lines.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let explicit_filter = match &args.log_level {
        Some(level) => Some(EnvFilter::try_new(level).context("invalid --log-level")?),
        None => EnvFilter::try_from_default_env().ok(),
    };

    // Logging.Level lives in the config itself, so without an explicit filter
    // the loader's own events happen before a subscriber exists
    let config = match explicit_filter {
        Some(filter) => {
            init_logging(filter);
            load_config(&args)?
        }
        None => {
            let config = load_config(&args)?;
            let level = config.logging_level()?.unwrap_or_else(|| "info".to_string());
            let filter = EnvFilter::try_new(&level)
                .with_context(|| format!("invalid Logging.Level '{level}'"))?;
            init_logging(filter);
            config
        }
    };

    info!("Loaded {} sections from {}", config.len(), args.config.display());

    let discovery = build_sections(&config, &args.section)?;

    let format = if args.json {
        LineFormat::Json
    } else {
        LineFormat::Tabbed
    };
    let mut stdout = StreamPublisher::new(std::io::stdout().lock(), format);
    let sent = publish_discovery(&discovery, &mut [&mut stdout])?;

    info!(
        "Published {} discovery messages, {} declarations skipped",
        sent,
        discovery.skipped().len()
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<SensorConfig> {
    load_sensor_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))
}

fn init_logging(filter: EnvFilter) {
    // stdout carries the discovery output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
