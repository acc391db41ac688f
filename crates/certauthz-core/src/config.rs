//! Allow-list configuration and mode validation.
//!
//! ```yaml
//! domains:
//!   - "example.org"
//!   - "*.example.org"
//! ```
//!
//! or
//!
//! ```yaml
//! regex: "^example[.]org$"
//! ```

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Operator allow-list. Exactly one of the two fields must be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Raw regular expression, compiled as-is (no anchoring, no case folding).
    pub regex: String,

    /// Domain patterns; `*` matches exactly one DNS label's characters.
    pub domains: Vec<String>,
}

/// The active matching mode of a validated [`AuthzConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode<'a> {
    /// Operator-supplied expression.
    Regex(&'a str),
    /// Domain patterns, in configuration order.
    Domains(&'a [String]),
}

impl AuthzConfig {
    /// Allow-list backed by a raw regular expression.
    pub fn from_regex(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            domains: Vec::new(),
        }
    }

    /// Allow-list backed by domain patterns.
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regex: String::new(),
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Determine which mode is configured.
    ///
    /// # Errors
    ///
    /// [`ConfigError::BothSpecified`] when both fields are set,
    /// [`ConfigError::NoneSpecified`] when neither is.
    pub fn mode(&self) -> Result<MatchMode<'_>> {
        match (self.regex.is_empty(), self.domains.is_empty()) {
            (false, false) => Err(ConfigError::BothSpecified),
            (true, true) => Err(ConfigError::NoneSpecified),
            (false, true) => Ok(MatchMode::Regex(&self.regex)),
            (true, false) => Ok(MatchMode::Domains(&self.domains)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_modes_is_rejected() {
        // GIVEN: a regex and a domain list
        let cfg = AuthzConfig {
            regex: "^example[.]org$".to_string(),
            domains: vec!["example.org".to_string()],
        };
        // THEN: ambiguous
        assert!(matches!(cfg.mode(), Err(ConfigError::BothSpecified)));
    }

    #[test]
    fn empty_config_is_rejected() {
        let cfg = AuthzConfig::default();
        assert!(matches!(cfg.mode(), Err(ConfigError::NoneSpecified)));
    }

    #[test]
    fn regex_mode_is_detected() {
        let cfg = AuthzConfig::from_regex("^a$");
        assert_eq!(cfg.mode().unwrap(), MatchMode::Regex("^a$"));
    }

    #[test]
    fn domain_mode_keeps_order() {
        let cfg = AuthzConfig::from_domains(["b.org", "a.org"]);
        let MatchMode::Domains(domains) = cfg.mode().unwrap() else {
            panic!("expected domain mode");
        };
        assert_eq!(domains, ["b.org", "a.org"]);
    }

    #[test]
    fn empty_domain_list_with_regex_is_regex_mode() {
        let cfg = AuthzConfig {
            regex: "x".to_string(),
            domains: vec![],
        };
        assert!(matches!(cfg.mode(), Ok(MatchMode::Regex("x"))));
    }

    #[test]
    fn deserialises_from_yaml() {
        let cfg: AuthzConfig =
            serde_yaml::from_str("domains:\n  - example.org\n  - \"*.example.org\"").unwrap();
        assert!(cfg.regex.is_empty());
        assert_eq!(cfg.domains, vec!["example.org", "*.example.org"]);
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let cfg: AuthzConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, AuthzConfig::default());
    }
}
