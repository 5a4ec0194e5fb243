//! Companion connection to the origin.
//!
//! The connect starts before the caller's upgrade is accepted and runs on its
//! own task. Dropping the handle aborts it, so an upgrade that never completes
//! does not leave an origin socket behind.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{ProxyError, ProxyResult};
use crate::resilience::timeouts::with_optional_timeout;
use crate::routing::UpstreamTarget;

/// Origin-side socket of a bridge session.
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An upstream connect in flight.
#[derive(Debug)]
pub struct PendingUpstream {
    handle: JoinHandle<ProxyResult<UpstreamSocket>>,
}

impl PendingUpstream {
    /// Begin connecting to `target`. Must be called inside a Tokio runtime.
    pub fn spawn(target: &UpstreamTarget, connect_timeout: Option<Duration>) -> ProxyResult<Self> {
        let request = target
            .to_uri()?
            .into_client_request()
            .map_err(|e| ProxyError::InvalidRequestUrl(e.to_string()))?;
        let target = target.to_string();

        let handle = tokio::spawn(async move {
            tracing::debug!(upstream = %target, "Connecting upstream websocket");
            let (socket, response) = with_optional_timeout(connect_timeout, connect_async(request))
                .await
                .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))??;
            tracing::debug!(
                upstream = %target,
                status = %response.status(),
                "Upstream websocket connected"
            );
            Ok::<_, ProxyError>(socket)
        });

        Ok(Self { handle })
    }

    /// Wait for the connect to finish.
    pub async fn connected(mut self) -> ProxyResult<UpstreamSocket> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(ProxyError::UpstreamUnreachable(format!(
                "upstream connect task failed: {e}"
            ))),
        }
    }
}

impl Drop for PendingUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
