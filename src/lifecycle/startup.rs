//! Startup orchestration.
//!
//! # Responsibilities
//! - Prepare the data and uploads directories
//! - Bind the listener and provision TLS before any traffic is accepted
//! - Start the shutdown coordinator alongside the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener starts accepting last (traffic only when ready)

use std::net::SocketAddr;

use crate::config::FileServerConfig;
use crate::fs::{DirectoryLayout, LayoutError};
use crate::http::server::{self, FileServer};
use crate::http::MountError;
use crate::lifecycle::{signals, ShutdownCoordinator};
use crate::net::{listener, tls, Listener, ListenerError, TlsError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("invalid shutdown timeout {value:?}: {source}")]
    Timeout {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error("cannot describe listen address: {0}")]
    Url(#[from] url::ParseError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the file server until it has shut down.
pub async fn run(config: FileServerConfig) -> Result<(), StartupError> {
    let layout = DirectoryLayout::prepare(&config.storage)?;

    let timeout = config
        .shutdown
        .timeout()
        .map_err(|source| StartupError::Timeout {
            value: config.shutdown.timeout.clone(),
            source,
        })?;

    let listener = Listener::bind(&config.listener)?;
    let addr = listener.local_addr();

    let tls = if config.tls.enabled {
        Some(tls::load_tls_config(&config.tls, &certificate_names(addr))?)
    } else {
        None
    };

    let server = FileServer::new(&config, &layout)?;

    let url = listener::public_url(addr, tls.is_some())?;
    tracing::info!(url = %url, "Serving");
    server::log_roots(&layout);

    let coordinator = ShutdownCoordinator::new(timeout);
    tokio::spawn(coordinator.clone().run(signals::interrupt));

    server.run(listener, tls, coordinator).await?;

    tracing::info!("Done.");
    Ok(())
}

/// Extra names for a generated certificate: the address clients dial.
fn certificate_names(addr: SocketAddr) -> Vec<String> {
    let ip = addr.ip();
    if ip.is_unspecified() {
        vec!["localhost".to_string()]
    } else {
        vec![ip.to_string()]
    }
}
