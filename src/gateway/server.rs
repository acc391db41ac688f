//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum_server::Handle;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use certauthz_core::AuthorizationGate;

use super::acceptor::PeerCertAcceptor;
use super::{authz, upstream};
use crate::config::Config;
use crate::mtls::build_server_config;
use crate::{Error, Result};

/// mTLS gateway server
pub struct Server {
    config: Config,
    gate: Arc<AuthorizationGate>,
    upstream: Arc<upstream::Upstream>,
}

impl Server {
    /// Validate the configuration and build the gate and upstream client.
    ///
    /// # Errors
    ///
    /// Any configuration problem; nothing is bound yet.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let gate = AuthorizationGate::new(&config.authz.rules, config.authz.name.clone())?;
        info!(
            name = %gate.name(),
            domain_mode = gate.matcher().is_domain_mode(),
            regex = %gate.matcher().as_str(),
            "Authorization gate ready"
        );

        let upstream = upstream::Upstream::new(&config.upstream.url, config.server.request_timeout)?;

        Ok(Self {
            config,
            gate: Arc::new(gate),
            upstream: Arc::new(upstream),
        })
    }

    /// Application router: gate in front of the upstream proxy.
    pub fn router(&self) -> Router {
        authz::layer(
            upstream::router(Arc::clone(&self.upstream)),
            Arc::clone(&self.gate),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// TLS material that fails to load, or a bind/serve failure.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let tls = build_server_config(&self.config.tls)?;
        let acceptor = PeerCertAcceptor::new(Arc::new(tls));
        let app = self.router();

        let handle = Handle::new();
        let grace = self.config.server.shutdown_timeout;
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!(grace = ?grace, "Shutdown signal received");
            shutdown.graceful_shutdown(Some(grace));
        });

        info!(
            address = %addr,
            require_client_cert = self.config.tls.require_client_cert,
            "Listening"
        );

        axum_server::bind(addr)
            .acceptor(acceptor)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
