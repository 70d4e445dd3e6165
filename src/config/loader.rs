//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::FileServerConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it. Callers apply overrides first.
pub fn read_config(path: &Path) -> Result<FileServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_config;

    #[test]
    fn loads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fileserver.toml");
        fs::write(
            &path,
            r#"
            [listener]
            address = "127.0.0.1"
            port = 9000

            [tls]
            enabled = false
            "#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.listener.port, 9000);
        assert!(!config.tls.enabled);
    }

    #[test]
    fn parsed_file_still_needs_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fileserver.toml");
        fs::write(
            &path,
            r#"
            [listener]
            address = "127.0.0.1"

            [shutdown]
            timeout = "eventually"
            "#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        let err = ConfigError::Validation(validate_config(&config).unwrap_err());
        assert!(err.to_string().contains("shutdown.timeout"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
