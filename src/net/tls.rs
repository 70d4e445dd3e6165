//! TLS configuration for the listener.

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;

use crate::config::TlsConfig;
use crate::net::cert::{self, CertError, SelfSignedParams, ServerCertificate};

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error(transparent)]
    Certificate(#[from] CertError),

    #[error("rustls rejected the certificate: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Obtain the certificate the listener will present.
///
/// Self-signed mode generates one in memory; otherwise the configured PEM
/// files are loaded. Extra subject alternative names (typically the listen
/// address) are only used for generated certificates.
pub fn provision_certificate(
    config: &TlsConfig,
    extra_names: &[String],
) -> Result<ServerCertificate, CertError> {
    if config.self_signed {
        let mut params = SelfSignedParams::new(&config.common_name, &config.organization);
        params.subject_alt_names = extra_names.to_vec();
        params.is_ca = config.self_signed_ca;
        cert::generate_with(&params)
    } else {
        cert::load_pem_files(&config.cert_path, &config.key_path)
    }
}

/// Build a rustls server configuration presenting `certificate`.
pub fn server_config(certificate: ServerCertificate) -> Result<Arc<ServerConfig>, TlsError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certificate.chain, certificate.key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

/// Certificate provisioning and rustls setup in one step.
pub fn load_tls_config(config: &TlsConfig, extra_names: &[String]) -> Result<RustlsConfig, TlsError> {
    let certificate = provision_certificate(config, extra_names)?;
    Ok(RustlsConfig::from_config(server_config(certificate)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_certificate_is_accepted_by_rustls() {
        let certificate = cert::generate_self_signed("localhost", "test").unwrap();
        let config = server_config(certificate).unwrap();
        assert!(config.alpn_protocols.contains(&b"http/1.1".to_vec()));
    }

    #[test]
    fn file_mode_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = TlsConfig {
            self_signed: false,
            cert_path: dir.path().join("missing.pem"),
            key_path: dir.path().join("missing.key"),
            ..TlsConfig::default()
        };

        let err = provision_certificate(&config, &[]).unwrap_err();
        assert!(matches!(err, CertError::CertNotFound(_)));
    }

    #[test]
    fn self_signed_mode_adds_extra_names() {
        let config = TlsConfig::default();
        let certificate = provision_certificate(&config, &["127.0.0.1".to_string()]).unwrap();
        assert_eq!(
            certificate.common_name.as_deref(),
            Some("fileserver.siliconvortex.com")
        );
    }
}
