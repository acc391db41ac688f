//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mTLS gateway that authorizes clients by certificate DNS names
#[derive(Parser, Debug)]
#[command(name = "certauthz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CERTAUTHZ_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CERTAUTHZ_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "CERTAUTHZ_HOST")]
    pub host: Option<String>,

    /// Upstream base URL allowed requests are forwarded to
    // Not CERTAUTHZ_UPSTREAM: the config loader reads that as the `upstream` section.
    #[arg(long, env = "CERTAUTHZ_UPSTREAM_URL")]
    pub upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CERTAUTHZ_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CERTAUTHZ_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Evaluate DNS names against the configured allow-list
    Check {
        /// Names to evaluate, each as a single-SAN certificate
        #[arg(required = true)]
        names: Vec<String>,

        /// Print the compiled expression
        #[arg(long)]
        show_regex: bool,
    },

    /// Test PKI helpers
    #[command(subcommand)]
    Tls(TlsCommand),
}

/// TLS subcommands
#[derive(Subcommand, Debug)]
pub enum TlsCommand {
    /// Generate a self-signed CA
    InitCa {
        /// CA common name
        #[arg(long, default_value = "certauthz test CA")]
        cn: String,

        /// Output directory (`ca.crt`, `ca.key`)
        #[arg(short, long, default_value = "tls")]
        out: PathBuf,

        /// Validity in days
        #[arg(long, default_value_t = 3650)]
        days: u32,
    },

    /// Issue a certificate signed by the CA
    Issue {
        /// Subject common name
        #[arg(long)]
        cn: String,

        /// DNS SAN entry (repeatable, order is kept)
        #[arg(long = "san-dns")]
        san_dns: Vec<String>,

        /// CA certificate (PEM)
        #[arg(long, default_value = "tls/ca.crt")]
        ca_cert: PathBuf,

        /// CA private key (PEM)
        #[arg(long, default_value = "tls/ca.key")]
        ca_key: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "tls")]
        out: PathBuf,

        /// File stem for `<name>.crt` / `<name>.key` (defaults to the CN)
        #[arg(long)]
        name: Option<String>,

        /// Validity in days
        #[arg(long, default_value_t = 365)]
        days: u32,
    },
}
