//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use certauthz_core::AuthzConfig;

use crate::mtls::config::TlsConfig;
use crate::{Error, Result};

/// Prefix of environment variables merged over the file.
pub const ENV_PREFIX: &str = "CERTAUTHZ_";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerConfig,
    /// Server certificate and client trust
    pub tls: TlsConfig,
    /// Allow-list
    pub authz: AuthzSection,
    /// Where allowed requests go
    pub upstream: UpstreamConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Upstream request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8443,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// `authz` section: instance name plus the allow-list rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzSection {
    /// Instance name, used in logs
    pub name: String,
    /// `regex` or `domains`
    #[serde(flatten)]
    pub rules: AuthzConfig,
}

impl Default for AuthzSection {
    fn default() -> Self {
        Self {
            name: "certauthz".to_string(),
            rules: AuthzConfig::default(),
        }
    }
}

/// Upstream configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://127.0.0.1:8080`
    pub url: String,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Check everything `serve` needs before binding.
    ///
    /// # Errors
    ///
    /// The first problem found: TLS paths, allow-list shape, upstream URL.
    pub fn validate(&self) -> Result<()> {
        self.tls.validate()?;
        self.authz.rules.mode()?;
        if self.upstream.url.is_empty() {
            return Err(Error::Config("upstream.url is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certauthz_core::{ConfigError, MatchMode};
    use figment::Jail;

    fn complete() -> Config {
        Config {
            tls: TlsConfig {
                server_cert: "s.crt".to_string(),
                server_key: "s.key".to_string(),
                ca_cert: "ca.crt".to_string(),
                ..Default::default()
            },
            authz: AuthzSection {
                rules: AuthzConfig::from_domains(["example.org"]),
                ..Default::default()
            },
            upstream: UpstreamConfig {
                url: "http://127.0.0.1:8080".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8443);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.authz.name, "certauthz");
        assert!(config.tls.require_client_cert);
    }

    #[test]
    fn load_reads_all_sections() {
        Jail::expect_with(|jail| {
            // GIVEN: a complete YAML file
            jail.create_file(
                "certauthz.yaml",
                r#"
server:
  port: 9443
  request_timeout: 5s
tls:
  server_cert: /tls/server.crt
  server_key: /tls/server.key
  ca_cert: /tls/ca.crt
  require_client_cert: false
authz:
  name: edge
  domains:
    - "*.example.org"
    - example.com
upstream:
  url: http://127.0.0.1:8080
"#,
            )?;
            // WHEN
            let config =
                Config::load(Some(Path::new("certauthz.yaml"))).map_err(|e| e.to_string())?;
            // THEN
            assert_eq!(config.server.port, 9443);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.request_timeout, Duration::from_secs(5));
            assert!(!config.tls.require_client_cert);
            assert_eq!(config.authz.name, "edge");
            assert_eq!(
                config.authz.rules.domains,
                vec!["*.example.org".to_string(), "example.com".to_string()]
            );
            assert!(config.authz.rules.regex.is_empty());
            assert_eq!(config.upstream.url, "http://127.0.0.1:8080");
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn load_reads_regex_mode() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "certauthz.yaml",
                "authz:\n  regex: '^(a|b)\\.example\\.org$'\n",
            )?;
            let config =
                Config::load(Some(Path::new("certauthz.yaml"))).map_err(|e| e.to_string())?;
            assert!(matches!(
                config.authz.rules.mode().unwrap(),
                MatchMode::Regex(r) if r == r"^(a|b)\.example\.org$"
            ));
            Ok(())
        });
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Config::load(Some(Path::new("/nonexistent/certauthz.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            // GIVEN: a file plus double-underscore env overrides
            jail.create_file("certauthz.yaml", "upstream:\n  url: http://file:8080\n")?;
            jail.set_env("CERTAUTHZ_UPSTREAM__URL", "http://env:9090");
            jail.set_env("CERTAUTHZ_SERVER__PORT", "10443");
            // WHEN
            let config =
                Config::load(Some(Path::new("certauthz.yaml"))).map_err(|e| e.to_string())?;
            // THEN: env wins
            assert_eq!(config.upstream.url, "http://env:9090");
            assert_eq!(config.server.port, 10443);
            Ok(())
        });
    }

    #[test]
    fn cli_env_vars_do_not_break_loading() {
        Jail::expect_with(|jail| {
            // GIVEN: the env vars the CLI reads for its own flags
            jail.set_env("CERTAUTHZ_UPSTREAM_URL", "http://cli:8080");
            jail.set_env("CERTAUTHZ_PORT", "9000");
            jail.set_env("CERTAUTHZ_HOST", "0.0.0.0");
            jail.set_env("CERTAUTHZ_LOG_LEVEL", "debug");
            // WHEN: loading without a file
            let config = Config::load(None).map_err(|e| e.to_string())?;
            // THEN: they land on unknown top-level keys and change nothing
            assert!(config.upstream.url.is_empty());
            assert_eq!(config.server.port, 8443);
            assert_eq!(config.server.host, "127.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn validate_requires_tls() {
        let mut config = complete();
        config.tls.ca_cert.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_both_rule_kinds() {
        let mut config = complete();
        config.authz.rules.regex = ".*".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::Authz(ConfigError::BothSpecified))
        ));
    }

    #[test]
    fn validate_requires_upstream() {
        let mut config = complete();
        config.upstream.url.clear();
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("upstream.url"));
    }
}
