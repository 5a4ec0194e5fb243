//! Upstream addressing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request URI
//!     → rewrite.rs (swap scheme + authority, strip mount prefix)
//!     → UpstreamTarget (consumed by http relay and websocket bridge)
//!
//! Inbound query string
//!     → query.rs (ticket lookup for the bridge entry guard)
//! ```
//!
//! # Design Decisions
//! - Dispatch itself is Axum's job; this module only computes where to go
//! - Targets are recomputed per request, never cached

pub mod query;
pub mod rewrite;

pub use rewrite::{TargetKind, UpstreamTarget, UrlRewriter};
