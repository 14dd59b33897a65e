//! # Proxima Server
//!
//! Proximity HTTP service with real-time position broadcast over
//! server-sent events.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! proxima
//!
//! # Run with custom config
//! proxima --config /path/to/proxima.toml
//!
//! # Run with environment overrides
//! PROXIMA_PORT=8080 PROXIMA_HOST=0.0.0.0 PROXIMA_AUTH__API_KEYS=k1,k2 proxima
//! ```

mod auth;
mod config;
mod consent;
mod error;
mod handlers;
mod manifest;
mod metrics;
mod stream;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxima=debug,proxima_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match config_path() {
        Some(path) => config::Config::from_file(path)?,
        None => config::Config::load()?,
    };

    tracing::info!("Starting Proxima server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}

/// Value of a `--config <path>` or `--config=<path>` argument.
fn config_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}
