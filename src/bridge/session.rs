//! One bridged WebSocket exchange.
//!
//! # Responsibilities
//! - Wait for the companion origin connection
//! - Forward frames in both directions concurrently
//! - Close both endpoints on the first terminal event from either side
//!
//! # Design Decisions
//! - Both directions are polled by one `select!`; neither waits on the other
//! - Closing is idempotent: failures on an already-closed endpoint are ignored
//! - Every close is bounded by the configured close timeout

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::{Message as ClientMessage, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;

use crate::bridge::frames::{self, CloseReason, Inbound};
use crate::bridge::state::{BridgeState, SessionId};
use crate::bridge::upstream::PendingUpstream;
use crate::observability::metrics;

/// First event that ended the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Caller sent a close frame or its stream ended.
    ClientClosed(Option<CloseReason>),
    /// Origin sent a close frame or its stream ended.
    UpstreamClosed(Option<CloseReason>),
    /// Reading from or writing to the caller failed.
    ClientError(String),
    /// Reading from or writing to the origin failed.
    UpstreamError(String),
    /// The origin connection was never established.
    ConnectFailed(String),
}

impl TerminalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalEvent::ClientClosed(_) => "client_closed",
            TerminalEvent::UpstreamClosed(_) => "upstream_closed",
            TerminalEvent::ClientError(_) => "client_error",
            TerminalEvent::UpstreamError(_) => "upstream_error",
            TerminalEvent::ConnectFailed(_) => "connect_failed",
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct BridgeOutcome {
    pub session_id: SessionId,
    pub terminated_by: TerminalEvent,
    pub frames_to_upstream: u64,
    pub frames_to_client: u64,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Client,
    Upstream,
}

impl Side {
    fn closed(self, reason: Option<CloseReason>) -> TerminalEvent {
        match self {
            Side::Client => TerminalEvent::ClientClosed(reason),
            Side::Upstream => TerminalEvent::UpstreamClosed(reason),
        }
    }

    fn errored(self, error: impl Display) -> TerminalEvent {
        match self {
            Side::Client => TerminalEvent::ClientError(error.to_string()),
            Side::Upstream => TerminalEvent::UpstreamError(error.to_string()),
        }
    }

    fn peer(self) -> Side {
        match self {
            Side::Client => Side::Upstream,
            Side::Upstream => Side::Client,
        }
    }
}

/// A bridge session from upgrade request to final close.
#[derive(Debug)]
pub struct BridgeSession {
    id: SessionId,
    state: BridgeState,
    close_timeout: Duration,
}

impl BridgeSession {
    pub fn new(close_timeout: Duration) -> Self {
        Self {
            id: SessionId::new(),
            state: BridgeState::AwaitingUpgrade,
            close_timeout,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Guards rejected the upgrade; no endpoint was ever opened.
    pub fn reject(mut self, reason: &'static str) {
        tracing::debug!(session_id = %self.id, reason, "Bridge upgrade rejected");
        self.advance(BridgeState::Closed);
    }

    /// Upstream connect started; the upgrade is about to be accepted.
    pub fn begin_connecting(&mut self) {
        self.advance(BridgeState::Connecting);
    }

    fn advance(&mut self, next: BridgeState) {
        if self.state.can_advance_to(next) {
            tracing::trace!(
                session_id = %self.id,
                from = self.state.as_str(),
                to = next.as_str(),
                "Bridge state change"
            );
            self.state = next;
        } else {
            tracing::warn!(
                session_id = %self.id,
                from = self.state.as_str(),
                to = next.as_str(),
                "Ignored illegal bridge state change"
            );
        }
    }

    /// Splice `client` to the origin connection until either side ends.
    pub async fn run(mut self, mut client: WebSocket, upstream: PendingUpstream) -> BridgeOutcome {
        metrics::bridge_session_opened();

        let upstream = match upstream.connected().await {
            Ok(socket) => socket,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Upstream websocket connect failed");
                metrics::record_upstream_failure("bridge_connect");
                self.advance(BridgeState::Closing);
                close_endpoint(&mut client, Some(frames::client_close(None)), self.close_timeout).await;
                return self.finish(TerminalEvent::ConnectFailed(e.to_string()), 0, 0);
            }
        };

        self.advance(BridgeState::Bridging);
        tracing::debug!(session_id = %self.id, "Bridge established");

        let (mut client_tx, mut client_rx) = client.split();
        let (mut upstream_tx, mut upstream_rx) = upstream.split();
        let mut frames_to_upstream = 0u64;
        let mut frames_to_client = 0u64;

        let event = tokio::select! {
            event = pump(
                &mut client_rx,
                &mut upstream_tx,
                frames::from_client,
                Side::Client,
                &mut frames_to_upstream,
            ) => event,
            event = pump(
                &mut upstream_rx,
                &mut client_tx,
                frames::from_upstream,
                Side::Upstream,
                &mut frames_to_client,
            ) => event,
        };

        self.advance(BridgeState::Closing);
        let limit = self.close_timeout;
        match &event {
            TerminalEvent::ClientClosed(reason) => {
                close_endpoint(&mut upstream_tx, Some(frames::upstream_close(reason.clone())), limit).await;
                close_endpoint(&mut client_tx, None::<ClientMessage>, limit).await;
            }
            TerminalEvent::ClientError(_) => {
                close_endpoint(&mut upstream_tx, Some(frames::upstream_close(None)), limit).await;
                close_endpoint(&mut client_tx, None::<ClientMessage>, limit).await;
            }
            TerminalEvent::UpstreamClosed(reason) => {
                close_endpoint(&mut client_tx, Some(frames::client_close(reason.clone())), limit).await;
                close_endpoint(&mut upstream_tx, None::<UpstreamMessage>, limit).await;
            }
            TerminalEvent::UpstreamError(_) | TerminalEvent::ConnectFailed(_) => {
                close_endpoint(&mut client_tx, Some(frames::client_close(None)), limit).await;
                close_endpoint(&mut upstream_tx, None::<UpstreamMessage>, limit).await;
            }
        }

        self.finish(event, frames_to_upstream, frames_to_client)
    }

    fn finish(mut self, event: TerminalEvent, frames_to_upstream: u64, frames_to_client: u64) -> BridgeOutcome {
        self.advance(BridgeState::Closed);
        metrics::bridge_session_closed(event.as_str());
        BridgeOutcome {
            session_id: self.id,
            terminated_by: event,
            frames_to_upstream,
            frames_to_client,
        }
    }
}

/// Forward frames from `source` to `sink` until a terminal event.
async fn pump<R, W, In, Out, E>(
    source: &mut R,
    sink: &mut W,
    classify: fn(In) -> Inbound<Out>,
    side: Side,
    forwarded: &mut u64,
) -> TerminalEvent
where
    R: Stream<Item = Result<In, E>> + Unpin,
    E: Display,
    W: Sink<Out> + Unpin,
    W::Error: Display,
{
    loop {
        match source.next().await {
            Some(Ok(msg)) => match classify(msg) {
                Inbound::Forward(out) => {
                    if let Err(e) = sink.send(out).await {
                        return side.peer().errored(e);
                    }
                    *forwarded += 1;
                }
                Inbound::Close(reason) => return side.closed(reason),
                Inbound::Skip => {}
            },
            Some(Err(e)) => return side.errored(e),
            None => return side.closed(None),
        }
    }
}

/// Best-effort close of one endpoint, bounded by `limit`.
///
/// Returns false when the limit was hit. Errors from an endpoint that is
/// already closed are ignored.
async fn close_endpoint<S, M>(sink: &mut S, farewell: Option<M>, limit: Duration) -> bool
where
    S: Sink<M> + Unpin,
{
    tokio::time::timeout(limit, async {
        if let Some(frame) = farewell {
            let _ = sink.send(frame).await;
        }
        let _ = sink.close().await;
    })
    .await
    .is_ok()
}
