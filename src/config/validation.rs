//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream authority and mount prefix
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{uri::Authority, HeaderName};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.host is required")]
    MissingUpstreamHost,

    #[error("upstream.host '{0}' is not a valid host[:port]")]
    InvalidUpstreamHost(String),

    #[error("upstream.path_prefix '{0}' must start with '/' and not end with '/'")]
    InvalidPathPrefix(String),

    #[error("upstream.identity_header '{0}' is not a valid header name")]
    InvalidIdentityHeader(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.bridge_close_secs must be greater than zero")]
    ZeroCloseTimeout,
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let upstream = &config.upstream;

    if upstream.host.trim().is_empty() {
        errors.push(ValidationError::MissingUpstreamHost);
    } else if !is_plain_authority(&upstream.host) {
        errors.push(ValidationError::InvalidUpstreamHost(upstream.host.clone()));
    }

    let prefix = &upstream.path_prefix;
    if !prefix.starts_with('/') || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidPathPrefix(prefix.clone()));
    }

    if HeaderName::from_bytes(upstream.identity_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidIdentityHeader(
            upstream.identity_header.clone(),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.bridge_close_secs == 0 {
        errors.push(ValidationError::ZeroCloseTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Host and optional port only; credentials are rejected.
fn is_plain_authority(host: &str) -> bool {
    match host.parse::<Authority>() {
        Ok(authority) => !authority.as_str().contains('@') && !authority.host().is_empty(),
        Err(_) => false,
    }
}
