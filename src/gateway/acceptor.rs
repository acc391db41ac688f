//! TLS acceptor that tags each connection with its client certificate.

use std::io;
use std::sync::Arc;

use axum::Extension;
use axum::middleware::AddExtension;
use axum_server::accept::Accept;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tower::Layer;
use tracing::debug;

use super::authz::PeerCertificate;
use crate::mtls::identity::view_from_peer_chain;

/// Wraps [`RustlsAcceptor`]: after the handshake, the peer leaf is parsed
/// once and attached to every request on the connection.
#[derive(Debug, Clone)]
pub struct PeerCertAcceptor {
    inner: RustlsAcceptor,
}

impl PeerCertAcceptor {
    /// Acceptor over a built rustls config.
    pub fn new(config: Arc<rustls::ServerConfig>) -> Self {
        Self {
            inner: RustlsAcceptor::new(RustlsConfig::from_config(config)),
        }
    }
}

impl<I, S> Accept<I, S> for PeerCertAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: Send + 'static,
{
    type Stream = TlsStream<I>;
    type Service = AddExtension<S, PeerCertificate>;
    type Future = BoxFuture<'static, io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let acceptor = self.inner.clone();

        Box::pin(async move {
            let (stream, service) = acceptor.accept(stream, service).await?;
            let (_, conn) = stream.get_ref();

            let peer = match view_from_peer_chain(conn.peer_certificates()) {
                Some(view) => {
                    debug!(subject = %view.display_name(), sans = view.dns_names.len(), "Client certificate presented");
                    PeerCertificate::new(view)
                }
                None => PeerCertificate::none(),
            };

            Ok((stream, Extension(peer).layer(service)))
        })
    }
}
