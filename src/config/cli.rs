//! Command-line flags layered over the configuration file.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::FileServerConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Default, Parser)]
#[command(name = "fileserver")]
#[command(about = "Serve a directory over HTTP(S) and accept uploads into it", long_about = None)]
pub struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to serve from
    #[arg(long, alias = "dataDir")]
    pub data_dir: Option<PathBuf>,

    /// Directory to upload to
    #[arg(long, alias = "uploadDir")]
    pub upload_dir: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    pub address: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host with TLS
    #[arg(long, action = ArgAction::Set)]
    pub tls: Option<bool>,

    /// Use a self-signed cert/key combo
    #[arg(long, action = ArgAction::Set)]
    pub tls_self_signed: Option<bool>,

    /// Path for the TLS certificate if --tls-self-signed=false
    #[arg(long)]
    pub tls_cert_path: Option<PathBuf>,

    /// Path for the TLS key if --tls-self-signed=false
    #[arg(long)]
    pub tls_key_path: Option<PathBuf>,

    /// Maximum time to wait for a clean shutdown
    #[arg(long)]
    pub timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    pub log_format: Option<String>,
}

impl Cli {
    /// Resolve the final configuration: defaults, then file, then flags.
    pub fn into_config(self) -> Result<FileServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => FileServerConfig::default(),
        };

        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut FileServerConfig) {
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
        if let Some(dir) = self.upload_dir {
            config.storage.uploads_dir = Some(dir);
        }
        if let Some(address) = self.address {
            config.listener.address = address;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(enabled) = self.tls {
            config.tls.enabled = enabled;
        }
        if let Some(self_signed) = self.tls_self_signed {
            config.tls.self_signed = self_signed;
        }
        if let Some(path) = self.tls_cert_path {
            config.tls.cert_path = path;
        }
        if let Some(path) = self.tls_key_path {
            config.tls.key_path = path;
        }
        if let Some(timeout) = self.timeout {
            config.shutdown.timeout = timeout;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}
