//! HTTP relay.
//!
//! # Responsibilities
//! - Refuse requests failing the identity guard before any upstream I/O
//! - Forward method, headers and streamed body to the rewritten target
//! - Hand the upstream status, headers and streamed body back, minus `set-cookie`
//! - Turn transport failures into a 500 envelope
//!
//! # Design Decisions
//! - Bodies are streamed both ways; memory is bounded by chunk size
//! - `host` is not forwarded; it follows from the target
//! - Redirects are relayed, not followed
//! - Exactly one upstream attempt per request

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, State},
    http::{header, Request},
    response::{IntoResponse, Response},
};

use crate::config::ProxyPolicy;
use crate::error::{ProxyError, ProxyResult};
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{TargetKind, UrlRewriter};
use crate::security::IdentityGuard;

/// Forwards plain HTTP exchanges for one policy snapshot.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    rewriter: UrlRewriter,
    identity: IdentityGuard,
}

impl HttpRelay {
    pub fn new(policy: &ProxyPolicy) -> ProxyResult<Self> {
        Ok(Self {
            client: build_client(policy.connect_timeout)?,
            rewriter: UrlRewriter::from_policy(policy),
            identity: IdentityGuard::from_policy(policy),
        })
    }

    /// Relay one request. Guard failures return before the upstream is contacted.
    pub async fn relay(&self, request: Request<Body>) -> ProxyResult<Response> {
        let (parts, body) = request.into_parts();

        let client_ip = self.identity.check(&parts.headers)?;
        let target = self.rewriter.rewrite(&parts.uri, TargetKind::Http)?;
        tracing::debug!(client_ip = ?client_ip, upstream = %target, "Forwarding upstream");
        let url = target.to_url()?;

        let mut headers = parts.headers;
        headers.remove(header::HOST);

        let mut outbound = self.client.request(parts.method, url).headers(headers);
        if !body.is_end_stream() {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound.send().await?;
        Ok(response::from_upstream(upstream))
    }
}

fn build_client(connect_timeout: Option<Duration>) -> ProxyResult<reqwest::Client> {
    // Egress goes straight to the origin; proxy variables in the environment are ignored.
    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none());
    if let Some(limit) = connect_timeout {
        builder = builder.connect_timeout(limit);
    }
    builder
        .build()
        .map_err(|e| ProxyError::UpstreamUnreachable(format!("HTTP client setup failed: {e}")))
}

/// Handler for every non-upgrade request under the mount prefix.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let runtime = state.runtime();
    let start = Instant::now();

    let request_id = request.headers().request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        peer = ?peer,
        "Relaying request"
    );

    let response = match runtime.relay.relay(request).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = %response.status(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Upstream responded"
            );
            response
        }
        Err(e @ ProxyError::UpstreamUnreachable(_)) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
            metrics::record_upstream_failure("relay");
            e.into_response()
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, reason = e.kind(), "Request refused");
            metrics::record_guard_rejection(e.kind());
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
