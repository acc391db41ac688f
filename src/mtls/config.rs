//! TLS listener configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! tls:
//!   server_cert: "/etc/certauthz/tls/server.crt"
//!   server_key:  "/etc/certauthz/tls/server.key"
//!   ca_cert:     "/etc/certauthz/tls/ca.crt"
//!   require_client_cert: true
//!   crl_path: "/etc/certauthz/tls/ca.crl"
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Server certificate, client trust store and client-auth mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to the PEM-encoded server certificate chain.
    pub server_cert: String,

    /// Path to the PEM-encoded server private key.
    pub server_key: String,

    /// Path to the PEM-encoded CA bundle used to verify client certificates.
    pub ca_cert: String,

    /// When `true`, handshakes without a client certificate signed by
    /// `ca_cert` fail.
    ///
    /// When `false`, such clients complete the handshake and reach the
    /// authorization gate with no certificate, which denies them.
    pub require_client_cert: bool,

    /// Optional PEM-encoded Certificate Revocation List.
    pub crl_path: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            server_cert: String::new(),
            server_key: String::new(),
            ca_cert: String::new(),
            require_client_cert: true,
            crl_path: None,
        }
    }
}

impl TlsConfig {
    /// Check that every required path is set.
    ///
    /// # Errors
    ///
    /// `Error::Config` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("tls.server_cert", &self.server_cert),
            ("tls.server_key", &self.server_key),
            ("tls.ca_cert", &self.ca_cert),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{field} is required")));
            }
        }
        Ok(())
    }
}
