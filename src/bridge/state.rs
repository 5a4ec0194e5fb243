//! Bridge session state machine.
//!
//! ```text
//! AwaitingUpgrade → Connecting → Bridging → Closing → Closed
//!        │              │                      ▲
//!        │              └──────────────────────┘ (upstream connect failed)
//!        └──────────────────────────────────────▶ Closed (guard rejected)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed ordering is enough: ids only need to be unique.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a bridge session, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ws-{}", self.0)
    }
}

/// Lifecycle of one bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Entry guards are being evaluated.
    AwaitingUpgrade,
    /// Upstream connect in flight, client upgrade accepted.
    Connecting,
    /// Both endpoints open, frames flowing both ways.
    Bridging,
    /// A terminal event was seen; both endpoints are being closed.
    Closing,
    /// Both endpoints closed. Final.
    Closed,
}

impl BridgeState {
    /// Whether `self → next` is a legal step.
    pub fn can_advance_to(self, next: BridgeState) -> bool {
        use BridgeState::*;
        matches!(
            (self, next),
            (AwaitingUpgrade, Connecting)
                | (AwaitingUpgrade, Closed)
                | (Connecting, Bridging)
                | (Connecting, Closing)
                | (Bridging, Closing)
                | (Closing, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BridgeState::AwaitingUpgrade => "awaiting_upgrade",
            BridgeState::Connecting => "connecting",
            BridgeState::Bridging => "bridging",
            BridgeState::Closing => "closing",
            BridgeState::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BridgeState::*;

    const ALL: [BridgeState; 5] = [AwaitingUpgrade, Connecting, Bridging, Closing, Closed];

    #[test]
    fn happy_path_is_legal() {
        let path = [AwaitingUpgrade, Connecting, Bridging, Closing, Closed];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} → {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn failed_connect_skips_bridging() {
        assert!(Connecting.can_advance_to(Closing));
    }

    #[test]
    fn closed_is_final() {
        for next in ALL {
            assert!(!Closed.can_advance_to(next));
        }
    }

    #[test]
    fn no_shortcut_to_closed_once_connecting() {
        assert!(!Connecting.can_advance_to(Closed));
        assert!(!Bridging.can_advance_to(Closed));
        assert!(!Bridging.can_advance_to(Connecting));
    }

    #[test]
    fn session_ids_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
