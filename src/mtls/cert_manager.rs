//! Certificate handling: PEM loading, rustls server config, test PKI.
//!
//! - [`build_server_config`] — `rustls::ServerConfig` with client-cert verification
//! - [`load_certs`] / [`load_private_key`] / [`load_crls`] — PEM file loading
//! - [`CertGenerator`] — `rcgen`-backed CA and leaf issuance for `certauthz tls`
//!
//! All files are PEM.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    Ia5String, IsCa, KeyPair, SanType, date_time_ymd,
};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, CertificateRevocationListDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::server::danger::ClientCertVerifier;
use tracing::debug;

use crate::mtls::config::TlsConfig;
use crate::{Error, Result};

/// Install the aws-lc-rs provider as the process default (first call wins).
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Build the listener's `rustls::ServerConfig`.
///
/// Client certificates are verified against `ca_cert` (and the CRL, if
/// configured). With `require_client_cert: false` anonymous clients are
/// let through the handshake.
///
/// # Errors
///
/// `Error::Tls` if a file cannot be read or parsed, or the server key does
/// not fit the certificate.
pub fn build_server_config(config: &TlsConfig) -> Result<ServerConfig> {
    install_crypto_provider();

    let server_certs = load_certs(&config.server_cert)?;
    let server_key = load_private_key(&config.server_key)?;
    let verifier = build_client_verifier(config)?;

    let mut tls_cfg = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(server_certs, server_key)
        .map_err(|e| Error::Tls(format!("TLS config error (cert/key mismatch?): {e}")))?;

    tls_cfg.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    debug!(
        server_cert = %config.server_cert,
        ca_cert = %config.ca_cert,
        require_client_cert = config.require_client_cert,
        crl = config.crl_path.is_some(),
        "mTLS server config built"
    );

    Ok(tls_cfg)
}

/// Load every certificate in a PEM file.
///
/// # Errors
///
/// `Error::Tls` if the file is unreadable or holds no certificate.
pub fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let pem = read_file(path)?;
    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("Failed to parse certs from '{path}': {e}")))?;

    if certs.is_empty() {
        return Err(Error::Tls(format!("No certificates found in '{path}'")));
    }
    Ok(certs)
}

/// Load the first private key (PKCS#8, PKCS#1 or SEC1) in a PEM file.
///
/// # Errors
///
/// `Error::Tls` if the file is unreadable or holds no key.
pub fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let pem = read_file(path)?;
    rustls_pemfile::private_key(&mut pem.as_slice())
        .map_err(|e| Error::Tls(format!("Failed to parse private key from '{path}': {e}")))?
        .ok_or_else(|| Error::Tls(format!("No private key found in '{path}'")))
}

/// Load every CRL in a PEM file.
///
/// # Errors
///
/// `Error::Tls` if the file is unreadable or malformed.
pub fn load_crls(path: &str) -> Result<Vec<CertificateRevocationListDer<'static>>> {
    let pem = read_file(path)?;
    rustls_pemfile::crls(&mut pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("Failed to parse CRL from '{path}': {e}")))
}

fn read_file(path: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::Tls(format!("Cannot read '{path}': {e}")))
}

fn build_client_verifier(config: &TlsConfig) -> Result<Arc<dyn ClientCertVerifier>> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in load_certs(&config.ca_cert)? {
        roots
            .add(cert)
            .map_err(|e| Error::Tls(format!("Failed to add CA cert to trust store: {e}")))?;
    }

    let mut builder = WebPkiClientVerifier::builder(Arc::new(roots));
    if let Some(ref crl_path) = config.crl_path {
        builder = builder.with_crls(load_crls(crl_path)?);
    }
    if !config.require_client_cert {
        builder = builder.allow_unauthenticated();
    }

    builder
        .build()
        .map_err(|e| Error::Tls(format!("Failed to build client verifier: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Test PKI generation
// ─────────────────────────────────────────────────────────────────────────────

/// A certificate and its key, both PEM.
#[derive(Debug)]
pub struct GeneratedCert {
    /// PEM-encoded certificate.
    pub cert_pem: String,
    /// PEM-encoded private key.
    pub key_pem: String,
}

/// Leaf certificate request.
#[derive(Debug)]
pub struct LeafRequest<'a> {
    /// Subject Common Name.
    pub cn: &'a str,
    /// DNS SAN entries, in the order they should appear.
    pub dns_names: &'a [String],
    /// Validity in days.
    pub validity_days: u32,
}

/// Issues a self-signed CA and leaf certificates signed by it.
pub struct CertGenerator;

impl CertGenerator {
    /// Generate a self-signed CA.
    ///
    /// # Errors
    ///
    /// `Error::Tls` if key generation or signing fails.
    pub fn init_ca(cn: &str, validity_days: u32) -> Result<GeneratedCert> {
        let key = KeyPair::generate()
            .map_err(|e| Error::Tls(format!("Failed to generate CA key: {e}")))?;

        let mut params = CertificateParams::default();
        params.distinguished_name = subject(cn);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.not_after = expiry(validity_days)?;

        let cert = params
            .self_signed(&key)
            .map_err(|e| Error::Tls(format!("CA cert generation failed: {e}")))?;

        Ok(GeneratedCert {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        })
    }

    /// Issue a leaf certificate signed by the given CA.
    ///
    /// The same certificate works as a server or client certificate.
    ///
    /// # Errors
    ///
    /// `Error::Tls` if the CA material does not parse, a DNS name is not
    /// IA5, or signing fails.
    pub fn issue_leaf(
        request: &LeafRequest<'_>,
        ca_cert_pem: &str,
        ca_key_pem: &str,
    ) -> Result<GeneratedCert> {
        let ca_key = KeyPair::from_pem(ca_key_pem)
            .map_err(|e| Error::Tls(format!("Failed to parse CA key: {e}")))?;
        let ca_cert = CertificateParams::from_ca_cert_pem(ca_cert_pem)
            .map_err(|e| Error::Tls(format!("Failed to parse CA cert: {e}")))?
            .self_signed(&ca_key)
            .map_err(|e| Error::Tls(format!("Failed to rebuild CA cert for signing: {e}")))?;

        let key = KeyPair::generate()
            .map_err(|e| Error::Tls(format!("Failed to generate leaf key: {e}")))?;

        let mut params = CertificateParams::default();
        params.distinguished_name = subject(request.cn);
        params.not_after = expiry(request.validity_days)?;
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        params.subject_alt_names = request
            .dns_names
            .iter()
            .map(|dns| {
                Ia5String::try_from(dns.as_str())
                    .map(SanType::DnsName)
                    .map_err(|e| Error::Tls(format!("Invalid DNS SAN '{dns}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let cert = params
            .signed_by(&key, &ca_cert, &ca_key)
            .map_err(|e| Error::Tls(format!("Leaf cert signing failed: {e}")))?;

        Ok(GeneratedCert {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        })
    }

    /// Write `<stem>.crt` and `<stem>.key` under `dir`.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the directory or files cannot be written.
    pub fn write_to_dir(cert: &GeneratedCert, dir: &Path, stem: &str) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(format!("{stem}.crt")), &cert.cert_pem)?;
        fs::write(dir.join(format!("{stem}.key")), &cert.key_pem)?;
        Ok(())
    }
}

fn subject(cn: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn
}

/// `days` from now, as the date type rcgen expects.
fn expiry(days: u32) -> Result<time::OffsetDateTime> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Internal(format!("System time error: {e}")))?
        .as_secs();
    let then = now.saturating_add(u64::from(days) * 86_400);

    let dt = time::OffsetDateTime::from_unix_timestamp(i64::try_from(then).unwrap_or(i64::MAX))
        .map_err(|e| Error::Internal(format!("Date calculation error: {e}")))?;

    Ok(date_time_ymd(dt.year(), dt.month() as u8, dt.day()))
}
