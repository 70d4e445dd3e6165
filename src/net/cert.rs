//! Server certificate provisioning.
//!
//! # Responsibilities
//! - Generate an ephemeral self-signed certificate when TLS runs in
//!   self-signed mode
//! - Load an externally supplied PEM certificate/key pair otherwise
//!
//! # Design Decisions
//! - Generated material lives in memory only; every start gets a new pair
//! - RSA-2048 keys, 7 day validity, second-precision timestamps
//! - Serial numbers come from the clock in nanoseconds and never repeat
//!   within one process
//! - Leaf certificate by default; CA marking is opt-in

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose, SerialNumber,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use time::OffsetDateTime;

/// Validity of every generated certificate.
pub const SELF_SIGNED_VALIDITY: time::Duration = time::Duration::days(7);

const RSA_KEY_BITS: usize = 2048;

static LAST_SERIAL: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("failed to generate key: {0}")]
    KeyGeneration(String),

    #[error("system clock unusable for certificate validity: {0}")]
    Clock(String),

    #[error("failed to create certificate: {0}")]
    Certificate(#[from] rcgen::Error),

    #[error("certificate file not found: {0:?}")]
    CertNotFound(std::path::PathBuf),

    #[error("private key file not found: {0:?}")]
    KeyNotFound(std::path::PathBuf),

    #[error("no certificate found in {0:?}")]
    EmptyChain(std::path::PathBuf),

    #[error("no private key found in {0:?}")]
    MissingKey(std::path::PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validity window of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// A private key with its certificate chain, owned by the listener.
#[derive(Debug)]
pub struct ServerCertificate {
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
    /// Present for generated certificates only.
    pub common_name: Option<String>,
    pub serial: Option<u64>,
    pub validity: Option<Validity>,
}

/// Subject and extension choices for a generated certificate.
#[derive(Debug, Clone)]
pub struct SelfSignedParams {
    pub common_name: String,
    pub organization: String,
    pub organizational_unit: Option<String>,
    pub subject_alt_names: Vec<String>,
    pub is_ca: bool,
}

impl SelfSignedParams {
    pub fn new(common_name: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            organization: organization.into(),
            organizational_unit: Some("fileserver".to_string()),
            subject_alt_names: Vec::new(),
            is_ca: false,
        }
    }
}

/// Generate a leaf certificate for `common_name`.
pub fn generate_self_signed(
    common_name: &str,
    organization: &str,
) -> Result<ServerCertificate, CertError> {
    generate_with(&SelfSignedParams::new(common_name, organization))
}

pub fn generate_with(params: &SelfSignedParams) -> Result<ServerCertificate, CertError> {
    let rsa_key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
        .map_err(|e| CertError::KeyGeneration(e.to_string()))?;
    let pem = rsa_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CertError::KeyGeneration(e.to_string()))?;
    let key_pair = KeyPair::from_pem_and_sign_algo(&pem, &rcgen::PKCS_RSA_SHA256)?;

    let now = unix_now();
    let not_before = OffsetDateTime::from_unix_timestamp(now.as_secs() as i64)
        .map_err(|e| CertError::Clock(e.to_string()))?;
    let not_after = not_before + SELF_SIGNED_VALIDITY;
    let serial = next_serial(now.as_nanos() as u64);

    let mut sans = vec![params.common_name.clone()];
    sans.extend(params.subject_alt_names.iter().cloned());

    let mut cert_params = CertificateParams::new(sans)?;
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, params.common_name.as_str());
    dn.push(DnType::OrganizationName, params.organization.as_str());
    if let Some(unit) = &params.organizational_unit {
        dn.push(DnType::OrganizationalUnitName, unit.as_str());
    }
    cert_params.distinguished_name = dn;
    cert_params.not_before = not_before;
    cert_params.not_after = not_after;
    cert_params.serial_number = Some(SerialNumber::from(serial));
    cert_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    cert_params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    if params.is_ca {
        cert_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        cert_params.key_usages.push(KeyUsagePurpose::KeyCertSign);
    } else {
        cert_params.is_ca = IsCa::ExplicitNoCa;
    }

    let cert = cert_params.self_signed(&key_pair)?;

    tracing::info!(
        common_name = %params.common_name,
        serial,
        not_after = %not_after,
        is_ca = params.is_ca,
        "Generated self-signed certificate"
    );

    Ok(ServerCertificate {
        chain: vec![cert.der().clone()],
        key: PrivateKeyDer::Pkcs8(key_pair.serialize_der().into()),
        common_name: Some(params.common_name.clone()),
        serial: Some(serial),
        validity: Some(Validity {
            not_before,
            not_after,
        }),
    })
}

/// Load a PEM certificate chain and private key from disk.
pub fn load_pem_files(cert_path: &Path, key_path: &Path) -> Result<ServerCertificate, CertError> {
    if !cert_path.exists() {
        return Err(CertError::CertNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(CertError::KeyNotFound(key_path.to_path_buf()));
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| CertError::Io { path, source }
    };

    let mut reader = BufReader::new(File::open(cert_path).map_err(io_err(cert_path))?);
    let chain = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err(cert_path))?;
    if chain.is_empty() {
        return Err(CertError::EmptyChain(cert_path.to_path_buf()));
    }

    let mut reader = BufReader::new(File::open(key_path).map_err(io_err(key_path))?);
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(io_err(key_path))?
        .ok_or_else(|| CertError::MissingKey(key_path.to_path_buf()))?;

    tracing::info!(
        cert_path = %cert_path.display(),
        certificates = chain.len(),
        "Loaded TLS certificate from disk"
    );

    Ok(ServerCertificate {
        chain,
        key,
        common_name: None,
        serial: None,
        validity: None,
    })
}

fn unix_now() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Strictly increasing serial, seeded from the clock.
fn next_serial(candidate: u64) -> u64 {
    let mut last = LAST_SERIAL.load(Ordering::SeqCst);
    loop {
        let next = candidate.max(last + 1);
        match LAST_SERIAL.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_are_strictly_increasing() {
        let a = next_serial(10);
        let b = next_serial(10);
        let c = next_serial(5);
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn generated_certificate_covers_now_for_seven_days() {
        let cert = generate_self_signed("fileserver.test", "test org").unwrap();
        let validity = cert.validity.unwrap();

        assert!(validity.contains(OffsetDateTime::now_utc()));
        assert_eq!(validity.not_after - validity.not_before, time::Duration::days(7));
        assert_eq!(cert.chain.len(), 1);
        assert_eq!(cert.common_name.as_deref(), Some("fileserver.test"));
    }

    #[test]
    fn consecutive_generations_use_different_serials() {
        let first = generate_self_signed("a.test", "org").unwrap();
        let second = generate_self_signed("a.test", "org").unwrap();
        assert_ne!(first.serial, second.serial);
        assert_ne!(first.chain[0], second.chain[0]);
    }

    #[test]
    fn missing_pem_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("cert.key");

        assert!(matches!(
            load_pem_files(&cert, &key),
            Err(CertError::CertNotFound(_))
        ));

        std::fs::write(&cert, "").unwrap();
        assert!(matches!(
            load_pem_files(&cert, &key),
            Err(CertError::KeyNotFound(_))
        ));

        std::fs::write(&key, "").unwrap();
        assert!(matches!(
            load_pem_files(&cert, &key),
            Err(CertError::EmptyChain(_))
        ));
    }

    #[test]
    fn loads_generated_pem_pair() {
        let key_pair = KeyPair::generate().unwrap();
        let params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let cert = params.self_signed(&key_pair).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("cert.key");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();

        let loaded = load_pem_files(&cert_path, &key_path).unwrap();
        assert_eq!(loaded.chain.len(), 1);
        assert!(loaded.validity.is_none());
    }
}
