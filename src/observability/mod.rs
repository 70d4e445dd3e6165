//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and services produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → counters (metrics.rs, optional Prometheus scrape endpoint)
//!
//! Every request carries an x-request-id that is recorded on its span.
//! ```

pub mod logging;
pub mod metrics;
