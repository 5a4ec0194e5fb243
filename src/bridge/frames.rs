//! Frame conversion between the caller-facing and origin-facing sockets.
//!
//! Axum and tungstenite each have their own message type. Conversion keeps
//! the frame kind and payload bytes; nothing is re-encoded.

use axum::extract::ws::{CloseFrame as ClientCloseFrame, Message as ClientMessage};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as UpstreamCloseFrame;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;

/// Close status carried from one side to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    /// Codes that must never be sent in a close frame.
    const RESERVED: [u16; 3] = [1005, 1006, 1015];

    /// Whether this status may be put on the wire.
    pub fn is_sendable(&self) -> bool {
        !Self::RESERVED.contains(&self.code)
    }
}

impl From<ClientCloseFrame> for CloseReason {
    fn from(frame: ClientCloseFrame) -> Self {
        Self {
            code: frame.code,
            reason: frame.reason.as_str().to_owned(),
        }
    }
}

impl From<UpstreamCloseFrame> for CloseReason {
    fn from(frame: UpstreamCloseFrame) -> Self {
        Self {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_owned(),
        }
    }
}

/// Close frame for the caller side. Unsendable codes become a bare close.
pub fn client_close(reason: Option<CloseReason>) -> ClientMessage {
    ClientMessage::Close(reason.filter(CloseReason::is_sendable).map(|r| ClientCloseFrame {
        code: r.code,
        reason: r.reason.into(),
    }))
}

/// Close frame for the origin side. Unsendable codes become a bare close.
pub fn upstream_close(reason: Option<CloseReason>) -> UpstreamMessage {
    UpstreamMessage::Close(reason.filter(CloseReason::is_sendable).map(|r| UpstreamCloseFrame {
        code: CloseCode::from(r.code),
        reason: r.reason.into(),
    }))
}

/// A frame read from one side, classified for forwarding.
#[derive(Debug)]
pub enum Inbound<M> {
    /// Data or control frame to forward as-is.
    Forward(M),
    /// Peer started the closing handshake.
    Close(Option<CloseReason>),
    /// Nothing to forward (raw frames never surface from a reader).
    Skip,
}

/// Classify a caller frame, converting data frames for the origin.
pub fn from_client(msg: ClientMessage) -> Inbound<UpstreamMessage> {
    match msg {
        ClientMessage::Text(text) => {
            Inbound::Forward(UpstreamMessage::Text(text.as_str().to_owned().into()))
        }
        ClientMessage::Binary(data) => Inbound::Forward(UpstreamMessage::Binary(data)),
        ClientMessage::Ping(data) => Inbound::Forward(UpstreamMessage::Ping(data)),
        ClientMessage::Pong(data) => Inbound::Forward(UpstreamMessage::Pong(data)),
        ClientMessage::Close(frame) => Inbound::Close(frame.map(CloseReason::from)),
    }
}

/// Classify an origin frame, converting data frames for the caller.
pub fn from_upstream(msg: UpstreamMessage) -> Inbound<ClientMessage> {
    match msg {
        UpstreamMessage::Text(text) => {
            Inbound::Forward(ClientMessage::Text(text.as_str().to_owned().into()))
        }
        UpstreamMessage::Binary(data) => Inbound::Forward(ClientMessage::Binary(data)),
        UpstreamMessage::Ping(data) => Inbound::Forward(ClientMessage::Ping(data)),
        UpstreamMessage::Pong(data) => Inbound::Forward(ClientMessage::Pong(data)),
        UpstreamMessage::Close(frame) => Inbound::Close(frame.map(CloseReason::from)),
        UpstreamMessage::Frame(_) => Inbound::Skip,
    }
}
