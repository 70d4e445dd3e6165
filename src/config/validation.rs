//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, upload limit > 0)
//! - Check formats (IP address, durations, mount paths)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FileServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use crate::config::schema::FileServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.address {0:?} is not an IP address")]
    InvalidAddress(String),

    #[error("shutdown.timeout {value:?} is not a duration: {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("shutdown.timeout must be greater than zero")]
    ZeroTimeout,

    #[error("uploads.max_bytes must be greater than zero")]
    ZeroUploadLimit,

    #[error("uploads.field_name must not be empty")]
    EmptyFieldName,

    #[error("assets.fallback {0:?} must be an absolute URL path")]
    InvalidFallback(String),

    #[error("observability.log_format {0:?} must be \"pretty\" or \"json\"")]
    InvalidLogFormat(String),
}

pub fn validate_config(config: &FileServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(config.listener.address.clone()));
    }

    match config.shutdown.timeout() {
        Ok(d) if d.is_zero() => errors.push(ValidationError::ZeroTimeout),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidTimeout {
            value: config.shutdown.timeout.clone(),
            reason: e.to_string(),
        }),
    }

    if config.uploads.max_bytes == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }
    if config.uploads.field_name.is_empty() {
        errors.push(ValidationError::EmptyFieldName);
    }

    if let Some(fallback) = &config.assets.fallback {
        if !fallback.starts_with('/') {
            errors.push(ValidationError::InvalidFallback(fallback.clone()));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
