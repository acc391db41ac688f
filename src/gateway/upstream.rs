//! Reverse proxy to the protected upstream
//!
//! Allowed requests are replayed against `upstream.url` with the same
//! method, path, query, headers and body. The upstream's status, headers
//! and body stream back to the client. Hop-by-hop headers are dropped in
//! both directions.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use tracing::{debug, warn};

use crate::mtls::cert_manager::install_crypto_provider;
use crate::{Error, Result};

/// Largest request body buffered for forwarding. Larger bodies get 413.
pub const MAX_REQUEST_BODY: usize = 16 * 1024 * 1024;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    base_url: String,
}

impl Upstream {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the URL is empty or not http(s), `Error::Upstream`
    /// if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.is_empty() {
            return Err(Error::Config("upstream.url is required".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "upstream.url must be an http(s) URL, got '{base_url}'"
            )));
        }

        install_crypto_provider();
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute upstream URL for a request target like `/a/b?c=d`.
    pub fn target(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }

    /// Forward one request and return the upstream response.
    ///
    /// # Errors
    ///
    /// `Error::Upstream` if the upstream cannot be reached.
    pub async fn forward(&self, parts: Parts, body: Bytes) -> Result<Response> {
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        let url = self.target(path_and_query);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        debug!(method = %parts.method, url = %url, "Forwarding request");

        let upstream_resp = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("{url}: {e}")))?;

        let status = upstream_resp.status();
        let mut resp_headers = upstream_resp.headers().clone();
        strip_hop_by_hop(&mut resp_headers);

        let mut response = Response::new(Body::from_stream(upstream_resp.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = resp_headers;
        Ok(response)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Router that forwards every request to `upstream`.
///
/// The body is buffered before forwarding; one over [`MAX_REQUEST_BODY`]
/// is rejected with 413 and never sent upstream.
pub fn router(upstream: Arc<Upstream>) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .with_state(upstream)
}

async fn proxy_handler(
    State(upstream): State<Arc<Upstream>>,
    parts: Parts,
    body: Bytes,
) -> Response {
    match upstream.forward(parts, body).await {
        Ok(response) => response,
        Err(e) => {
            warn!(upstream = %upstream.base_url(), error = %e, "Upstream request failed");
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}
