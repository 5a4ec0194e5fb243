//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming relay request:
//!     → identity.rs (origin-assigned client IP present?)
//!     → Pass to relay
//!
//! Outgoing response:
//!     → headers.rs (add security headers the upstream left out)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject before any upstream I/O
//! - Authorization decisions belong to the origin, not the relay

pub mod headers;
pub mod identity;

pub use identity::IdentityGuard;
