//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch under the mount prefix)
//!     → request.rs (request ID)
//!     → {prefix}/ws with Upgrade → websocket.rs (guards) → bridge
//!     → anything else            → relay.rs (guard, rewrite, forward)
//!     → response.rs (strip set-cookie, error envelopes)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use relay::HttpRelay;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ProxyRuntime, ServerError};
