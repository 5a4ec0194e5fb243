//! Upstream URL derivation.
//!
//! # Responsibilities
//! - Replace scheme and authority with the configured origin
//! - Strip the mount prefix from the path
//! - Pass the query string through byte-for-byte
//!
//! # Design Decisions
//! - Pure function of (inbound URI, policy, target kind); no I/O
//! - Scheme is chosen from two bits: development mode and HTTP vs upgrade
//! - Malformed input fails before any upstream activity

use std::fmt;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;

use crate::config::ProxyPolicy;
use crate::error::{ProxyError, ProxyResult};

/// What the upstream call is for; decides the scheme family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Http,
    WebSocket,
}

impl TargetKind {
    /// Scheme for this kind: plain in development, secure otherwise.
    pub fn scheme(self, dev_mode: bool) -> &'static str {
        match (self, dev_mode) {
            (TargetKind::Http, true) => "http",
            (TargetKind::Http, false) => "https",
            (TargetKind::WebSocket, true) => "ws",
            (TargetKind::WebSocket, false) => "wss",
        }
    }
}

/// Upstream location derived from one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub scheme: &'static str,
    pub authority: Authority,
    pub path: String,
    pub query: Option<String>,
}

impl UpstreamTarget {
    /// Path plus `?query` when present.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Full URI, as used for the WebSocket handshake.
    pub fn to_uri(&self) -> ProxyResult<Uri> {
        let scheme = self
            .scheme
            .parse::<Scheme>()
            .map_err(|e| ProxyError::InvalidRequestUrl(e.to_string()))?;
        let path_and_query = self
            .path_and_query()
            .parse::<PathAndQuery>()
            .map_err(|e| ProxyError::InvalidRequestUrl(e.to_string()))?;

        Uri::builder()
            .scheme(scheme)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::InvalidRequestUrl(e.to_string()))
    }

    /// Full URL, as used by the HTTP client.
    pub fn to_url(&self) -> ProxyResult<url::Url> {
        url::Url::parse(&self.to_string()).map_err(|e| ProxyError::InvalidRequestUrl(e.to_string()))
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path_and_query())
    }
}

/// Derives upstream targets for one policy snapshot.
#[derive(Debug, Clone)]
pub struct UrlRewriter {
    authority: Authority,
    path_prefix_len: usize,
    dev_mode: bool,
}

impl UrlRewriter {
    pub fn new(authority: Authority, path_prefix_len: usize, dev_mode: bool) -> Self {
        Self {
            authority,
            path_prefix_len,
            dev_mode,
        }
    }

    pub fn from_policy(policy: &ProxyPolicy) -> Self {
        Self::new(
            policy.upstream_authority.clone(),
            policy.path_prefix_len,
            policy.dev_mode,
        )
    }

    /// Rewrite an inbound request URI into its upstream target.
    pub fn rewrite(&self, inbound: &Uri, kind: TargetKind) -> ProxyResult<UpstreamTarget> {
        let path_and_query = inbound
            .path_and_query()
            .ok_or_else(|| ProxyError::InvalidRequestUrl(format!("no path in '{inbound}'")))?;

        let path = strip_prefix_chars(path_and_query.path(), self.path_prefix_len);

        let target = UpstreamTarget {
            scheme: kind.scheme(self.dev_mode),
            authority: self.authority.clone(),
            path,
            query: path_and_query.query().map(str::to_owned),
        };

        // Refuse anything that would not survive as a request target.
        target.to_uri()?;
        Ok(target)
    }
}

/// Drop the first `n` characters of `path`, keeping it rooted.
fn strip_prefix_chars(path: &str, n: usize) -> String {
    let rest = match path.char_indices().nth(n) {
        Some((idx, _)) => &path[idx..],
        None => "",
    };

    if rest.starts_with('/') {
        rest.to_owned()
    } else {
        format!("/{rest}")
    }
}
