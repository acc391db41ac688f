//! Mutual TLS: listener config, peer certificate parsing, test PKI.
//!
//! ```text
//! TCP connection
//!   → TLS handshake   (rustls verifies the client cert against ca_cert)
//!   → CertificateView (CN + DNS SANs of the leaf)
//!   → PeerCertificate request extension
//!   → authorization gate
//! ```
//!
//! - [`config`] — `tls:` section
//! - [`identity`] — X.509 leaf → [`CertificateView`](certauthz_core::CertificateView)
//! - [`cert_manager`] — rustls server config and the `certauthz tls` generators

pub mod cert_manager;
pub mod config;
pub mod identity;

pub use cert_manager::{
    CertGenerator, GeneratedCert, LeafRequest, build_server_config, load_certs, load_crls,
    load_private_key,
};
pub use config::TlsConfig;
pub use identity::{view_from_der, view_from_peer_chain};
