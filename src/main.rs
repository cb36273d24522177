//! India Post Tracking API
//!
//! Serves tracking lookups backed by the MIS CEPT portal.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ handlers ──▶ tracker ──▶ upstream session ──▶ MIS CEPT
//!                                                     │
//!     Client Response                                 ▼
//!     ◀────────────── envelope ◀──── status/dates ◀── parser
//! ```

use std::path::PathBuf;

use clap::Parser;

use indiapost_tracker::config::load_config;
use indiapost_tracker::lifecycle::{self, signals, Shutdown};
use indiapost_tracker::observability::logging;

#[derive(Parser)]
#[command(name = "indiapost-tracker")]
#[command(about = "India Post tracking API backed by MIS CEPT", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "TRACKER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.tracking_url,
        max_bulk = config.api.max_bulk,
        strict_validation = config.api.strict_validation,
        "Configuration loaded"
    );

    let (server, listener) = lifecycle::start(config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = signals::spawn_signal_listener(&shutdown);

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
