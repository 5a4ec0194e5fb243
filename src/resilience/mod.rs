//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (optional connect bound)
//!     → On failure: terminal, surfaced as 500 (relay) or close (bridge)
//! ```
//!
//! # Design Decisions
//! - No retries anywhere: one transport failure ends the exchange
//! - Teardown is always bounded so a stalled peer cannot pin a session

pub mod timeouts;
