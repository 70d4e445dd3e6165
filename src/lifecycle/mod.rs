//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Prepare directories → Bind listener → Provision certificate
//!     → Build routes → Start serving + start shutdown coordinator
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Trigger graceful shutdown
//!     Second signal while draining → Force close
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then filesystem and TLS, then listeners
//! - Shutdown has timeout: forced close after deadline
//! - Shutdown failures are logged, never retried

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{ShutdownCoordinator, ShutdownState};
pub use startup::{run, StartupError};
