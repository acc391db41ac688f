//! Peer certificate → [`CertificateView`].
//!
//! The TLS layer hands over the peer chain as DER blobs. Only the leaf
//! (first) certificate is read, and from it only the subject CN and the
//! DNS entries of the Subject Alternative Name extension.

use rustls::pki_types::CertificateDer;
use tracing::warn;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

use certauthz_core::CertificateView;

use crate::{Error, Result};

/// Parse a DER-encoded certificate into the view the gate evaluates.
///
/// # Errors
///
/// `Error::Tls` if the bytes are not a parseable X.509 certificate.
pub fn view_from_der(der: &[u8]) -> Result<CertificateView> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| Error::Tls(format!("Failed to parse client certificate: {e}")))?;

    Ok(CertificateView {
        common_name: extract_cn(&cert),
        dns_names: extract_dns_sans(&cert),
    })
}

/// Build the view for a connection from its peer chain.
///
/// Returns `None` when the client presented no certificate. A leaf that
/// cannot be parsed yields an empty view so the gate denies it.
pub fn view_from_peer_chain(chain: Option<&[CertificateDer<'_>]>) -> Option<CertificateView> {
    let leaf = chain?.first()?;
    match view_from_der(leaf.as_ref()) {
        Ok(view) => Some(view),
        Err(e) => {
            warn!(error = %e, "Unparseable client certificate, treating as no SANs");
            Some(CertificateView::default())
        }
    }
}

fn extract_cn(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

/// DNS SANs in the order they appear in the extension.
fn extract_dns_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let Ok(Some(san_ext)) = cert.subject_alternative_name() else {
        return Vec::new();
    };

    san_ext
        .value
        .general_names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some((*dns).to_owned()),
            _ => None,
        })
        .collect()
}
