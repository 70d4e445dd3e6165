//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ListenerConfig → listener.rs (bind, resolve public URL)
//!     TlsConfig      → cert.rs (generate self-signed | load PEM files)
//!                    → tls.rs (rustls ServerConfig)
//!     → handed to the HTTP layer, which starts accepting
//! ```
//!
//! # Design Decisions
//! - Everything here runs once, before the first connection is accepted
//! - Any failure is fatal: no certificate, no server
//! - TLS is optional and handled transparently by axum-server

pub mod cert;
pub mod listener;
pub mod tls;

pub use cert::{CertError, ServerCertificate, Validity};
pub use listener::{Listener, ListenerError};
pub use tls::TlsError;
