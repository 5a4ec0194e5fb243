//! Runtime policy derived from validated configuration.
//!
//! The relay and the bridge receive a `ProxyPolicy` explicitly; neither
//! reads configuration or environment on its own.

use std::time::Duration;

use axum::http::{uri::Authority, HeaderName};

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Deployment policy shared by the relay and the bridge.
#[derive(Debug, Clone)]
pub struct ProxyPolicy {
    /// Origin host and optional port.
    pub upstream_authority: Authority,
    /// Number of leading path characters stripped before forwarding.
    pub path_prefix_len: usize,
    /// Plain schemes upstream and no identity guard.
    pub dev_mode: bool,
    /// Require the identity header outside development mode.
    pub require_identity_signal: bool,
    /// Header carrying the origin-assigned client IP.
    pub identity_header: HeaderName,
    /// Upstream connect bound, `None` for the transport default.
    pub connect_timeout: Option<Duration>,
    /// Bound on closing one bridge endpoint.
    pub close_timeout: Duration,
}

impl ProxyPolicy {
    /// Validate `config` and build the policy from it.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, Vec<ValidationError>> {
        validate_config(config)?;
        let upstream = &config.upstream;

        let upstream_authority = upstream
            .host
            .parse::<Authority>()
            .map_err(|_| vec![ValidationError::InvalidUpstreamHost(upstream.host.clone())])?;
        let identity_header = HeaderName::from_bytes(upstream.identity_header.as_bytes())
            .map_err(|_| {
                vec![ValidationError::InvalidIdentityHeader(
                    upstream.identity_header.clone(),
                )]
            })?;

        let connect_timeout = match config.timeouts.connect_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            upstream_authority,
            path_prefix_len: upstream.path_prefix.len(),
            dev_mode: upstream.dev_mode,
            require_identity_signal: upstream.require_identity_signal,
            identity_header,
            connect_timeout,
            close_timeout: Duration::from_secs(config.timeouts.bridge_close_secs),
        })
    }

    /// Whether requests without the identity header must be rejected.
    pub fn enforces_identity_signal(&self) -> bool {
        self.require_identity_signal && !self.dev_mode
    }
}
