//! Transparent edge relay library.
//!
//! Mounts one origin under a path prefix. Plain HTTP is relayed with
//! `set-cookie` stripped; `{prefix}/ws` upgrades are bridged to the origin
//! socket frame by frame.

pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
