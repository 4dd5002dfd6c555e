//! Quadwave Bridge
//!
//! Quadwave SysEx → decoded events on stdout, plus MIDI passthrough.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quadwave_bridge::bridge::QuadwaveBridge;
use quadwave_bridge::config::{BridgeConfig, EventFormat};
use quadwave_bridge::discovery;

const DEFAULT_CONFIG: &str = "quadwave.yaml";

/// Quadwave SysEx decoder and MIDI passthrough
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; `quadwave.yaml` is used if present
    #[arg(short, long)]
    config: Option<String>,

    /// Input port (case-insensitive substring); auto-detected by default
    #[arg(long)]
    in_port: Option<String>,

    /// Output port (exact name or substring); virtual port by default
    #[arg(long)]
    out_port: Option<String>,

    /// Event output format
    #[arg(long, value_enum)]
    format: Option<EventFormat>,

    /// Prefix events with local time
    #[arg(long)]
    timestamps: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.log_json)?;

    if args.list_ports {
        discovery::list_ports_formatted();
        return Ok(());
    }

    // An explicitly named file must exist, even if it is the default one
    let required = args.config.is_some();
    let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG);
    let mut config = BridgeConfig::load_or_default(path, required).await?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!("Starting Quadwave Bridge v{}...", env!("CARGO_PKG_VERSION"));

    let bridge = QuadwaveBridge::open(&config)?;
    let stats = bridge.run(shutdown_signal()).await?;

    info!(
        neck = stats.neck_frames,
        touch = stats.touch_frames,
        config = stats.config_frames,
        passed_through = stats.passed_through,
        dropped = stats.dropped,
        events = stats.events,
        "👋 Bye"
    );
    Ok(())
}

fn apply_overrides(config: &mut BridgeConfig, args: &Args) {
    if let Some(port) = &args.in_port {
        config.midi.input_port = Some(port.clone());
    }
    if let Some(port) = &args.out_port {
        config.midi.output_port = Some(port.clone());
    }
    if let Some(format) = args.format {
        config.events.format = format;
    }
    if args.timestamps {
        config.events.timestamps = true;
    }
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries rendered events
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
