//! Timeout enforcement.
//!
//! # Responsibilities
//! - Optionally bound upstream connects (off unless configured)
//! - Bound each bridge teardown step
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - No request or idle timeout: streamed bodies and live sessions may run long

use std::future::Future;
use std::time::Duration;

/// The future did not finish within its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out after {:?}", self.0)
    }
}

impl std::error::Error for Elapsed {}

/// Run `fut`, bounded by `limit` when one is set.
pub async fn with_optional_timeout<F>(limit: Option<Duration>, fut: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| Elapsed(limit)),
        None => Ok(fut.await),
    }
}
