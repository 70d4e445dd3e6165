//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fileserver_uploads_total` (counter): upload attempts by `outcome`
//! - `fileserver_rejected_paths_total` (counter): refused paths by `reason`
//!
//! # Design Decisions
//! - Recording is always safe; without an installed exporter the macros
//!   are no-ops
//! - The Prometheus endpoint is optional and bound on its own address

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const UPLOADS_TOTAL: &str = "fileserver_uploads_total";
pub const REJECTED_PATHS_TOTAL: &str = "fileserver_rejected_paths_total";

/// Install the global recorder and serve `/metrics` on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!(UPLOADS_TOTAL, "Upload attempts by outcome");
    metrics::describe_counter!(REJECTED_PATHS_TOTAL, "Refused request or file paths by reason");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_upload(outcome: &'static str) {
    metrics::counter!(UPLOADS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_rejected_path(reason: &'static str) {
    metrics::counter!(REJECTED_PATHS_TOTAL, "reason" => reason).increment(1);
}
