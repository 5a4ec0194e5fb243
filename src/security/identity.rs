//! Identity-signal guard.
//!
//! Outside development mode the edge in front of the relay stamps every
//! request with the client IP it observed. A request without that header did
//! not come through the edge and is refused before any upstream I/O.

use axum::http::{HeaderMap, HeaderName};

use crate::config::ProxyPolicy;
use crate::error::{ProxyError, ProxyResult};

/// Checks for the origin-assigned client IP header.
#[derive(Debug, Clone)]
pub struct IdentityGuard {
    header: HeaderName,
    enforced: bool,
}

impl IdentityGuard {
    pub fn new(header: HeaderName, enforced: bool) -> Self {
        Self { header, enforced }
    }

    pub fn from_policy(policy: &ProxyPolicy) -> Self {
        Self::new(
            policy.identity_header.clone(),
            policy.enforces_identity_signal(),
        )
    }

    /// Returns the client address when the header is present.
    pub fn check<'a>(&self, headers: &'a HeaderMap) -> ProxyResult<Option<&'a str>> {
        let client_ip = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());

        match client_ip {
            None if self.enforced => Err(ProxyError::MissingIdentitySignal),
            other => Ok(other),
        }
    }
}
