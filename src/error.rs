//! Error kinds shared by the relay and the bridge.

use thiserror::Error;

/// Errors that end a single proxied exchange.
///
/// Every variant is terminal for the request or session it belongs to;
/// nothing in the relay retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// The inbound URL could not be turned into an upstream target.
    #[error("Invalid request URL: {0}")]
    InvalidRequestUrl(String),

    /// The origin-assigned client IP header is missing.
    #[error("No IP address found.")]
    MissingIdentitySignal,

    /// The bridge endpoint was called without `Upgrade: websocket`.
    #[error("Expected Upgrade: websocket")]
    UpgradeExpected,

    /// The bridge endpoint was called without a `ticket` query parameter.
    #[error("No ticket found.")]
    MissingTicket,

    /// Transport failure talking to the origin (DNS, connect, timeout, reset).
    #[error("{0}")]
    UpstreamUnreachable(String),
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequestUrl(_) => "invalid_request_url",
            ProxyError::MissingIdentitySignal => "missing_identity_signal",
            ProxyError::UpgradeExpected => "upgrade_expected",
            ProxyError::MissingTicket => "missing_ticket",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::UpstreamUnreachable(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ProxyError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ProxyError::UpstreamUnreachable(e.to_string())
    }
}
