//! WebSocket bridge subsystem.
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Proxy ←──── WebSocket frames ────→ Origin
//!
//! http/websocket.rs (entry guards, upgrade)
//!     → upstream.rs (origin connect, spawned before the upgrade is accepted)
//!     → session.rs (splice both directions, symmetric teardown)
//!         → frames.rs (frame kind preserved across socket types)
//!         → state.rs (AwaitingUpgrade → Connecting → Bridging → Closing → Closed)
//! ```
//!
//! # Design Decisions
//! - Frame-level forwarding (no message buffering)
//! - Close frames propagated in both directions
//! - Ping/pong forwarded like data frames
//! - No reconnect and no replay once a session is closed

pub mod frames;
pub mod session;
pub mod state;
pub mod upstream;

pub use session::{BridgeOutcome, BridgeSession, TerminalEvent};
pub use state::{BridgeState, SessionId};
pub use upstream::{PendingUpstream, UpstreamSocket};
