//! certauthz - mTLS gateway with DNS-SAN allow-listing

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use certauthz::{
    AuthorizationGate, CertificateView,
    cli::{Cli, Command, TlsCommand},
    config::Config,
    gateway::Server,
    mtls::{CertGenerator, LeafRequest},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::Check { ref names, show_regex }) => {
            run_check(cli.config.as_deref(), names, show_regex)
        }
        Some(Command::Tls(ref cmd)) => run_tls_command(cmd),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Evaluate names against the configured allow-list
fn run_check(config_path: Option<&Path>, names: &[String], show_regex: bool) -> ExitCode {
    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let gate = match AuthorizationGate::new(&config.authz.rules, config.authz.name.clone()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Invalid authz configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if show_regex {
        println!("regex: {}", gate.matcher().as_str());
    }

    let mut all_allowed = true;
    for name in names {
        let view = CertificateView::from_dns_names([name.as_str()]);
        let decision = gate.authorize(Some(&view));
        all_allowed &= decision.is_allow();
        println!("{} {name}", if decision.is_allow() { "allow" } else { "deny " });
    }

    if all_allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Generate test PKI material
fn run_tls_command(cmd: &TlsCommand) -> ExitCode {
    match cmd {
        TlsCommand::InitCa { cn, out, days } => {
            let ca = match CertGenerator::init_ca(cn, *days) {
                Ok(ca) => ca,
                Err(e) => {
                    eprintln!("Failed to generate CA: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = CertGenerator::write_to_dir(&ca, out, "ca") {
                eprintln!("Failed to write CA: {e}");
                return ExitCode::FAILURE;
            }
            println!("Wrote {0}/ca.crt and {0}/ca.key", out.display());
            ExitCode::SUCCESS
        }

        TlsCommand::Issue {
            cn,
            san_dns,
            ca_cert,
            ca_key,
            out,
            name,
            days,
        } => {
            let (ca_cert_pem, ca_key_pem) =
                match (fs::read_to_string(ca_cert), fs::read_to_string(ca_key)) {
                    (Ok(c), Ok(k)) => (c, k),
                    (Err(e), _) | (_, Err(e)) => {
                        eprintln!("Failed to read CA material: {e}");
                        return ExitCode::FAILURE;
                    }
                };

            let request = LeafRequest {
                cn,
                dns_names: san_dns,
                validity_days: *days,
            };
            let leaf = match CertGenerator::issue_leaf(&request, &ca_cert_pem, &ca_key_pem) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Failed to issue certificate: {e}");
                    return ExitCode::FAILURE;
                }
            };

            let stem = name.as_deref().unwrap_or(cn);
            if let Err(e) = CertGenerator::write_to_dir(&leaf, out, stem) {
                eprintln!("Failed to write certificate: {e}");
                return ExitCode::FAILURE;
            }
            println!("Wrote {0}/{stem}.crt and {0}/{stem}.key", out.display());
            ExitCode::SUCCESS
        }
    }
}

/// Run the gateway server
async fn run_server(cli: Cli) -> ExitCode {
    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(host) = cli.host {
                config.server.host = host;
            }
            if let Some(upstream) = cli.upstream {
                config.upstream.url = upstream;
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        name = %config.authz.name,
        port = config.server.port,
        upstream = %config.upstream.url,
        "Starting certauthz"
    );

    let server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
