//! Certificate-based authorization middleware
//!
//! Every request must carry a client certificate whose DNS SANs match the
//! configured allow-list. Allowed requests reach the wrapped router
//! untouched; everything else gets a 403 and never reaches it.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::warn;

use certauthz_core::{AuthorizationGate, AuthzConfig, CertificateView, ConfigError, Decision};

/// Body of every denied response.
pub const DENY_BODY: &str = "No matching DNSNames";

/// Client certificate of the connection a request arrived on.
///
/// Inserted into request extensions by the TLS acceptor. `None` means the
/// client completed the handshake without presenting a certificate.
#[derive(Debug, Clone, Default)]
pub struct PeerCertificate(pub Option<Arc<CertificateView>>);

impl PeerCertificate {
    /// Wrap a parsed certificate.
    pub fn new(view: CertificateView) -> Self {
        Self(Some(Arc::new(view)))
    }

    /// Connection without a client certificate.
    pub fn none() -> Self {
        Self(None)
    }

    /// The parsed certificate, if any.
    pub fn view(&self) -> Option<&CertificateView> {
        self.0.as_deref()
    }
}

/// Build a gate from `config` and wrap `next` with it.
///
/// # Errors
///
/// Any [`ConfigError`] from validating or compiling the allow-list. No
/// router is produced in that case.
pub fn build(
    config: &AuthzConfig,
    next: Router,
    name: impl Into<String>,
) -> Result<Router, ConfigError> {
    let gate = AuthorizationGate::new(config, name)?;
    Ok(layer(next, Arc::new(gate)))
}

/// Wrap `next` with an already-built gate.
pub fn layer(next: Router, gate: Arc<AuthorizationGate>) -> Router {
    next.layer(middleware::from_fn_with_state(gate, authz_middleware))
}

/// Authorization middleware
pub async fn authz_middleware(
    State(gate): State<Arc<AuthorizationGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let cert = request
        .extensions()
        .get::<PeerCertificate>()
        .and_then(PeerCertificate::view);

    match gate.authorize(cert) {
        Decision::Allow => next.run(request).await,
        Decision::Deny => {
            match cert {
                Some(view) => warn!(
                    gate = %gate.name(),
                    subject = %view.display_name(),
                    dns_names = ?view.dns_names,
                    path = %request.uri().path(),
                    "No matching DNSNames, request denied"
                ),
                None => warn!(
                    gate = %gate.name(),
                    path = %request.uri().path(),
                    "No client certificate, request denied"
                ),
            }
            forbidden_response()
        }
    }
}

/// 403 with a plain-text body.
pub fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        DENY_BODY,
    )
        .into_response()
}
