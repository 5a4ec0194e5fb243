//! WebSocket bridge entry point.
//!
//! # Responsibilities
//! - Evaluate the entry guards (`Upgrade: websocket`, `ticket` present)
//! - Start the origin connection, then accept the caller's upgrade
//! - Hand both endpoints to a `BridgeSession`
//!
//! # Design Decisions
//! - Guards run before anything touches the network
//! - `Upgrade` is compared exactly; anything but `websocket` gets 426
//! - The 101 response goes out while the origin connect is still in flight

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
};

use crate::bridge::{BridgeSession, PendingUpstream};
use crate::error::{ProxyError, ProxyResult};
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{query, TargetKind};

/// Query parameter the origin uses to authorize the socket.
pub const TICKET_PARAM: &str = "ticket";

/// Entry guards for the bridge. Returns the ticket on success.
pub fn check_upgrade(headers: &HeaderMap, uri: &Uri) -> ProxyResult<String> {
    let upgrade = headers.get(header::UPGRADE).and_then(|v| v.to_str().ok());
    if upgrade != Some("websocket") {
        return Err(ProxyError::UpgradeExpected);
    }

    query::param(uri.query(), TICKET_PARAM).ok_or(ProxyError::MissingTicket)
}

/// Handler for `GET {prefix}/ws`.
pub async fn websocket_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let runtime = state.runtime();
    let request_id = headers.request_id().to_string();
    let mut session = BridgeSession::new(runtime.policy.close_timeout);

    if let Err(e) = check_upgrade(&headers, &uri) {
        tracing::warn!(
            request_id = %request_id,
            session_id = %session.id(),
            reason = e.kind(),
            "Websocket upgrade refused"
        );
        metrics::record_guard_rejection(e.kind());
        session.reject(e.kind());
        return e.into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                session_id = %session.id(),
                error = %rejection,
                "Malformed websocket handshake"
            );
            session.reject("malformed_handshake");
            return rejection.into_response();
        }
    };

    let target = match runtime.rewriter.rewrite(&uri, TargetKind::WebSocket) {
        Ok(target) => target,
        Err(e) => {
            session.reject(e.kind());
            return e.into_response();
        }
    };

    let pending = match PendingUpstream::spawn(&target, runtime.policy.connect_timeout) {
        Ok(pending) => pending,
        Err(e) => {
            session.reject(e.kind());
            return e.into_response();
        }
    };
    session.begin_connecting();

    tracing::info!(
        request_id = %request_id,
        session_id = %session.id(),
        upstream = %target,
        "Accepting websocket upgrade"
    );

    let session_id = session.id();
    ws.on_failed_upgrade(move |e| {
        tracing::warn!(session_id = %session_id, error = %e, "Client websocket upgrade failed");
    })
    .on_upgrade(move |socket| async move {
        let outcome = session.run(socket, pending).await;
        tracing::info!(
            request_id = %request_id,
            session_id = %outcome.session_id,
            terminated_by = outcome.terminated_by.as_str(),
            frames_to_upstream = outcome.frames_to_upstream,
            frames_to_client = outcome.frames_to_client,
            "Bridge closed"
        );
    })
}
