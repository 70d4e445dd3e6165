//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the file server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the file server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileServerConfig {
    /// Listener configuration (address, port).
    pub listener: ListenerConfig,

    /// Served directories.
    pub storage: StorageConfig,

    /// TLS settings.
    pub tls: TlsConfig,

    /// Upload endpoint settings.
    pub uploads: UploadConfig,

    /// Embedded asset mount settings.
    pub assets: AssetsConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to bind (e.g., "192.168.1.20").
    pub address: String,

    /// TCP port to bind. `0` picks an ephemeral port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: crate::net::listener::default_address().to_string(),
            port: 1234,
        }
    }
}

/// Served directories.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory served under `/data`.
    pub data_dir: PathBuf,

    /// Directory served under `/uploads` and written by `/uploadFile`.
    /// Defaults to `<data_dir>/uploads`.
    pub uploads_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: working_dir().join("data"),
            uploads_dir: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of plain HTTP.
    pub enabled: bool,

    /// Generate an in-memory certificate at startup instead of loading one.
    pub self_signed: bool,

    /// Mark the generated certificate as its own CA.
    pub self_signed_ca: bool,

    /// Common name of the generated certificate.
    pub common_name: String,

    /// Organization of the generated certificate.
    pub organization: String,

    /// Path to certificate file (PEM), used when `self_signed` is off.
    pub cert_path: PathBuf,

    /// Path to private key file (PEM), used when `self_signed` is off.
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        let base = working_dir();
        Self {
            enabled: true,
            self_signed: true,
            self_signed_ca: false,
            common_name: "fileserver.siliconvortex.com".to_string(),
            organization: "siliconvortex.com".to_string(),
            cert_path: base.join("cert.pem"),
            key_path: base.join("cert.key"),
        }
    }
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Multipart field carrying the file.
    pub field_name: String,

    /// Maximum request body size in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: "originalFile".to_string(),
            max_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// Embedded asset mount configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AssetsConfig {
    /// Redirect unknown paths under `/` to this document instead of 404.
    pub fallback: Option<String>,
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Maximum time to wait for a clean shutdown ("60s", "1m30s", ...).
    pub timeout: String,
}

impl ShutdownConfig {
    /// Parsed drain timeout.
    pub fn timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.timeout)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: "60s".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Prometheus endpoint bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_address: None,
        }
    }
}

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
