//! End-to-end tests for the WebSocket bridge.

use std::sync::atomic::Ordering;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};
use tower::ServiceExt;

use origin_relay::http::HttpServer;

mod common;

use common::WAIT;

async fn next_message<S>(socket: &mut S) -> Message
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    timeout(WAIT, socket.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("websocket error")
}

#[tokio::test]
async fn test_missing_upgrade_header_is_426() {
    let backend = common::unused_addr().await;
    let server = HttpServer::new(common::dev_config(backend)).unwrap();

    let response = server
        .router()
        .oneshot(
            Request::get("/api/ws?ticket=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(body, "Expected Upgrade: websocket");
}

#[tokio::test]
async fn test_missing_ticket_is_400() {
    let backend = common::unused_addr().await;
    let server = HttpServer::new(common::dev_config(backend)).unwrap();

    let response = server
        .router()
        .oneshot(
            Request::get("/api/ws")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "No ticket found.");
}

#[tokio::test]
async fn test_non_upgrade_post_is_relayed() {
    let (backend, _) = common::start_echo_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend)).await;

    let res = common::client()
        .post(format!("http://{}/api/ws", relay.addr))
        .body("x")
        .send()
        .await
        .unwrap();

    let echoed: common::Echoed = res.json().await.unwrap();
    assert_eq!(echoed.path_and_query, "/ws");
}

#[tokio::test]
async fn test_head_on_ws_path_is_relayed() {
    let (backend, hits) = common::start_echo_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend)).await;

    let res = common::client()
        .head(format!("http://{}/api/ws?ticket=abc", relay.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-origin"], "echo");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_text_round_trip_and_upstream_target() {
    let backend = common::start_ws_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend.addr)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-1&room=9", relay.addr))
            .await
            .expect("handshake failed");

    socket.send(Message::text("hello".to_string())).await.unwrap();
    match next_message(&mut socket).await {
        Message::Text(text) => assert_eq!(text.as_str(), "world"),
        other => panic!("unexpected frame: {other:?}"),
    }

    let uri = timeout(WAIT, backend.handshake_uri).await.unwrap().unwrap();
    assert_eq!(uri, "/ws?ticket=t-1&room=9");
}

#[tokio::test]
async fn test_binary_frames_keep_their_kind() {
    let backend = common::start_ws_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend.addr)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-2", relay.addr))
            .await
            .unwrap();

    let payload = vec![0u8, 159, 146, 150, 255];
    socket.send(Message::binary(payload.clone())).await.unwrap();
    match next_message(&mut socket).await {
        Message::Binary(data) => assert_eq!(data.as_ref(), payload.as_slice()),
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_close_reaches_upstream() {
    let mut backend = common::start_ws_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend.addr)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-3", relay.addr))
            .await
            .unwrap();

    // Make sure the bridge is up before closing.
    socket.send(Message::text("hello".to_string())).await.unwrap();
    next_message(&mut socket).await;

    socket
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".to_string().into(),
        }))
        .await
        .unwrap();

    let seen = timeout(WAIT, backend.closed.recv())
        .await
        .expect("upstream was not closed")
        .unwrap();
    assert_eq!(seen, Some((1000, "bye".to_string())));

    // The session is over: the client stream ends and nothing more reaches the origin.
    let _ = socket.send(Message::text("late".to_string())).await;
    let drained = timeout(WAIT, async {
        while let Some(Ok(msg)) = socket.next().await {
            assert!(msg.is_close(), "data frame after close: {msg:?}");
        }
    })
    .await;
    assert!(drained.is_ok(), "client stream did not end");
    assert_eq!(backend.received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_drop_without_close_tears_down_upstream() {
    let mut backend = common::start_ws_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend.addr)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-6", relay.addr))
            .await
            .unwrap();

    socket.send(Message::text("hello".to_string())).await.unwrap();
    next_message(&mut socket).await;

    // No close frame: the TCP stream just goes away.
    drop(socket);

    let seen = timeout(WAIT, backend.closed.recv())
        .await
        .expect("upstream was not closed")
        .unwrap();
    assert_eq!(seen, None);
}

#[tokio::test]
async fn test_upstream_close_reaches_client() {
    let backend = common::start_ws_backend().await;
    let relay = common::spawn_relay(common::dev_config(backend.addr)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-4", relay.addr))
            .await
            .unwrap();

    socket.send(Message::text("close-me".to_string())).await.unwrap();
    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Normal);
            assert_eq!(frame.reason.as_str(), "done");
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn test_upstream_connect_failure_closes_client() {
    let backend = common::unused_addr().await;
    let relay = common::spawn_relay(common::dev_config(backend)).await;

    let (mut socket, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/api/ws?ticket=t-5", relay.addr))
            .await
            .expect("upgrade is accepted before the origin connect resolves");

    let ended = timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "client socket was not closed");
}
