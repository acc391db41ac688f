//! Error types for certauthz

use std::io;

use thiserror::Error;

use certauthz_core::ConfigError;

/// Result type alias for certauthz
pub type Result<T> = std::result::Result<T, Error>;

/// certauthz errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (file loading, missing fields, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Allow-list could not be built
    #[error("Authorization config error: {0}")]
    Authz(#[from] ConfigError),

    /// TLS material or rustls setup error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Forwarding to the upstream failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authz_error_converts_and_keeps_message() {
        let err: Error = ConfigError::NoneSpecified.into();
        assert!(matches!(err, Error::Authz(ConfigError::NoneSpecified)));
        assert!(err.to_string().contains("either a regex or a domain list"));
    }

    #[test]
    fn io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
