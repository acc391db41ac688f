//! certauthz
//!
//! mTLS gateway that admits a request only if the client certificate carries
//! a DNS Subject Alternative Name on the allow-list.
//!
//! # Features
//!
//! - **Allow-list**: exact names, `*` label wildcards, or a raw regex
//! - **mTLS**: rustls client verification with optional CRL
//! - **Proxy**: allowed requests are forwarded to one upstream
//! - **Test PKI**: `certauthz tls init-ca` / `certauthz tls issue`
//!
//! The matching engine lives in `certauthz-core`; this crate wires it to TLS
//! and HTTP.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mtls;

pub use certauthz_core::{
    AuthorizationGate, AuthzConfig, CertificateView, ConfigError, Decision, Matcher,
};
pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` wins over `level` when set. `format` of `"json"` selects JSON
/// lines; anything else is human-readable.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(format!("tracing init: {e}")))?,
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(format!("tracing init: {e}")))?,
    }

    Ok(())
}
