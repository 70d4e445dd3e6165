//! fileserver
//!
//! Serves a data directory and an uploads directory over HTTP or HTTPS and
//! accepts multipart uploads into the latter.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                   FILESERVER                     │
//!                 │                                                  │
//!  Client ───────▶│  net (listener + TLS) ──▶ http server            │
//!                 │                              │                   │
//!                 │          ┌───────────────────┼──────────────┐    │
//!                 │          ▼                   ▼              ▼    │
//!                 │    mount "/data"      mount "/uploads"   POST    │
//!                 │    mount "/" (embedded assets)       /uploadFile │
//!                 │          │                   │              │    │
//!                 │          └──── fs (safepath, layout) ◀──────┘    │
//!                 │                                                  │
//!                 │  Cross-cutting: config, observability, lifecycle │
//!                 └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use fileserver::config::Cli;
use fileserver::lifecycle;
use fileserver::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fileserver: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("fileserver: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fileserver starting");

    if let Some(address) = &config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => {
                tracing::error!(metrics_address = %address, "Failed to parse metrics address");
            }
        }
    }

    match lifecycle::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fileserver failed");
            ExitCode::FAILURE
        }
    }
}
