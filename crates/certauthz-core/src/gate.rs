//! Authorization decisions over a certificate's DNS SANs.

use tracing::debug;

use crate::{AuthzConfig, Matcher, Result};

/// Outcome of authorizing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// At least one SAN matched; hand the request to the next stage.
    Allow,
    /// No certificate, no SANs, or no SAN matched.
    Deny,
}

impl Decision {
    /// `true` for [`Decision::Allow`].
    #[must_use]
    pub fn is_allow(self) -> bool {
        self == Self::Allow
    }
}

/// The parts of a peer's leaf certificate the gate looks at.
///
/// Only DNS SAN entries take part in the decision; `common_name` is kept
/// for log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateView {
    /// Subject Common Name, if present.
    pub common_name: Option<String>,
    /// DNS SAN entries in certificate order.
    pub dns_names: Vec<String>,
}

impl CertificateView {
    /// A view carrying only DNS SAN entries.
    pub fn from_dns_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            common_name: None,
            dns_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Label for logs: the CN, else the first SAN, else `"<unknown>"`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .or_else(|| self.dns_names.first().map(String::as_str))
            .unwrap_or("<unknown>")
    }
}

/// A named allow-list instance.
///
/// Owns its [`Matcher`] for its whole lifetime. Share it behind an `Arc`.
#[derive(Debug)]
pub struct AuthorizationGate {
    name: String,
    matcher: Matcher,
}

impl AuthorizationGate {
    /// Validate `config` and compile the matcher.
    ///
    /// # Errors
    ///
    /// Any [`crate::ConfigError`]; a gate is never built half-configured.
    pub fn new(config: &AuthzConfig, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            matcher: Matcher::from_config(config)?,
        })
    }

    /// Instance name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled matcher.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// First SAN, in certificate order, accepted by the matcher.
    ///
    /// Later SANs are not evaluated once one matches.
    #[must_use]
    pub fn first_match<'c>(&self, cert: Option<&'c CertificateView>) -> Option<&'c str> {
        cert?
            .dns_names
            .iter()
            .map(String::as_str)
            .find(|name| self.matcher.is_match(name))
    }

    /// Decide a request given its peer certificate (if any).
    #[must_use]
    pub fn authorize(&self, cert: Option<&CertificateView>) -> Decision {
        if let Some(name) = self.first_match(cert) {
            debug!(instance = %self.name, san = %name, "SAN matched allow-list");
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}
