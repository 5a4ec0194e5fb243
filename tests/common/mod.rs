//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{
    handshake::server::{ErrorResponse, Request as HandshakeRequest, Response as HandshakeResponse},
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};

use origin_relay::config::ProxyConfig;
use origin_relay::http::HttpServer;
use origin_relay::lifecycle::Shutdown;

/// What the echo backend saw, returned as its JSON body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echoed {
    pub method: String,
    pub path_and_query: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Running relay under test. Dropping it stops the server.
pub struct RunningRelay {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `upstream` with dev mode on (plaintext, guard off).
pub fn dev_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.host = upstream.to_string();
    config.upstream.dev_mode = true;
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Bind the relay on an ephemeral port and serve it in the background.
pub async fn spawn_relay(config: ProxyConfig) -> RunningRelay {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    RunningRelay { addr, shutdown }
}

/// HTTP client that talks to the relay directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Start a backend that echoes each request as JSON.
///
/// Every reply carries two `set-cookie` headers and `x-origin: echo`.
/// Returns the address and a counter of requests served.
pub async fn start_echo_backend() -> (SocketAddr, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    let app = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);

            let headers = headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect();
            let echoed = Echoed {
                method: method.to_string(),
                path_and_query: uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default(),
                headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            };

            (
                StatusCode::CREATED,
                AppendHeaders([
                    ("set-cookie", "session=abc; Path=/"),
                    ("Set-Cookie", "theme=dark"),
                    ("x-origin", "echo"),
                ]),
                axum::Json(echoed),
            )
                .into_response()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

/// Start a backend that accepts TCP and immediately hangs up.
///
/// Returns the address and a counter of accepted connections.
pub async fn start_hangup_backend() -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicU32::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (addr, accepted)
}

/// Address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Observations from the WebSocket backend.
pub struct WsBackend {
    pub addr: SocketAddr,
    /// Request target of the first handshake.
    pub handshake_uri: oneshot::Receiver<String>,
    /// Close frame the backend received, if any, once its session ends.
    pub closed: mpsc::UnboundedReceiver<Option<(u16, String)>>,
    /// Text and binary frames received across all sessions.
    pub received: Arc<AtomicU32>,
}

/// Start a WebSocket backend that echoes text and binary frames.
///
/// A text frame `"hello"` is answered with `"world"`; `"close-me"` makes
/// the backend close with 1000 `"done"`.
pub async fn start_ws_backend() -> WsBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (uri_tx, handshake_uri) = oneshot::channel();
    let (closed_tx, closed) = mpsc::unbounded_channel();
    let received = Arc::new(AtomicU32::new(0));
    let frames = received.clone();

    tokio::spawn(async move {
        let mut uri_tx = Some(uri_tx);
        while let Ok((stream, _)) = listener.accept().await {
            let (seen_tx, seen_rx) = std::sync::mpsc::channel();
            let callback = move |req: &HandshakeRequest,
                                 resp: HandshakeResponse|
                  -> Result<HandshakeResponse, ErrorResponse> {
                let _ = seen_tx.send(req.uri().to_string());
                Ok(resp)
            };
            let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                continue;
            };
            if let (Some(tx), Ok(uri)) = (uri_tx.take(), seen_rx.try_recv()) {
                let _ = tx.send(uri);
            }

            let closed_tx = closed_tx.clone();
            let frames = frames.clone();
            tokio::spawn(async move {
                let mut close = None;
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_text() || msg.is_binary() {
                        frames.fetch_add(1, Ordering::SeqCst);
                    }
                    match msg {
                        Message::Text(text) if text.as_str() == "hello" => {
                            let _ = ws.send(Message::text("world".to_string())).await;
                        }
                        Message::Text(text) if text.as_str() == "close-me" => {
                            let _ = ws
                                .close(Some(CloseFrame {
                                    code: CloseCode::Normal,
                                    reason: "done".to_string().into(),
                                }))
                                .await;
                        }
                        other @ (Message::Text(_) | Message::Binary(_)) => {
                            let _ = ws.send(other).await;
                        }
                        Message::Close(frame) => {
                            close = frame.map(|f| (u16::from(f.code), f.reason.as_str().to_string()));
                            break;
                        }
                        _ => {}
                    }
                }
                let _ = closed_tx.send(close);
            });
        }
    });

    WsBackend {
        addr,
        handshake_uri,
        closed,
        received,
    }
}

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);
