//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn upstream replies into client responses (status, headers, streamed body)
//! - Remove `set-cookie` so origin cookies never override the proxy's own
//! - Map `ProxyError` to the error envelopes callers see
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Guard failures use `{"code","message"}`, transport failures `{"error"}`

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ProxyError;

/// Envelope for policy and precondition failures.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub code: u16,
    pub message: &'a str,
}

/// Envelope for upstream transport failures.
#[derive(Debug, Serialize)]
pub struct UpstreamErrorEnvelope<'a> {
    pub error: &'a str,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::UpgradeExpected => (
                StatusCode::UPGRADE_REQUIRED,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.to_string(),
            )
                .into_response(),
            ProxyError::UpstreamUnreachable(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UpstreamErrorEnvelope { error: message }),
            )
                .into_response(),
            ProxyError::InvalidRequestUrl(_)
            | ProxyError::MissingIdentitySignal
            | ProxyError::MissingTicket => {
                let message = self.to_string();
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorEnvelope {
                        code: StatusCode::BAD_REQUEST.as_u16(),
                        message: &message,
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Remove every `set-cookie` value. Header names are case-insensitive.
pub fn strip_set_cookie(headers: &mut HeaderMap) {
    headers.remove(header::SET_COOKIE);
}

/// Build the caller-facing response from an upstream reply, body unbuffered.
pub fn from_upstream(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_set_cookie(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
