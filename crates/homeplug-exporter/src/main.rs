//! HomePlug Exporter - Main entry point
//!
//! Discovers HomePlug AV devices on the local link and serves their network
//! topology and PHY rates as Prometheus metrics.

mod api;
mod config;
mod exposition;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use homeplug_core::MacAddress;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "homeplug-exporter")]
#[command(about = "Prometheus exporter for HomePlug AV power-line networks")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "homeplug-exporter.toml")]
    config: PathBuf,

    /// Address on which to expose metrics
    #[arg(short, long)]
    bind: Option<String>,

    /// Path under which to expose metrics
    #[arg(long)]
    metrics_path: Option<String>,

    /// Interface to search for HomePlug devices
    #[arg(short, long)]
    interface: Option<String>,

    /// Destination address for HomePlug devices (or broadcast, all, local)
    #[arg(short, long, value_parser = MacAddress::from_destination)]
    destination: Option<MacAddress>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single discovery cycle and exit
    #[arg(long)]
    scan_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("HomePlug Exporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration, command line wins over the file
    let mut config = config::load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }
    if let Some(path) = args.metrics_path {
        config.daemon.metrics_path = path;
    }
    if let Some(interface) = args.interface {
        config.homeplug.interface = Some(interface);
    }
    if let Some(destination) = args.destination {
        config.homeplug.destination = destination;
    }

    let state = state::AppState::new(config.clone())?;

    if args.scan_once {
        info!("Running single discovery cycle");
        let result = state.collector.collect().await;
        state.collector.shutdown().await;
        let result = result?;
        println!(
            "Discovered {} networks, {} stations:",
            result.networks.len(),
            result.stations.len()
        );
        for network in &result.networks {
            println!(
                "  network {} snid={} tei={} role={} cco={} (tei {})",
                network.network_id_hex(),
                network.short_id,
                network.terminal_equipment_id,
                network.role,
                network.coordinator_address,
                network.coordinator_terminal_equipment_id
            );
        }
        for station in &result.stations {
            println!(
                "  station {} tei={} bridged={} tx={} B/s rx={} B/s",
                station.address,
                station.terminal_equipment_id,
                station.bridged_address,
                station.tx_rate_bytes(),
                station.rx_rate_bytes()
            );
        }
    } else {
        server::run(state, &config.daemon.bind).await?;
    }

    Ok(())
}
