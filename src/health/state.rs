//! Peer health state machine.
//!
//! # States
//! - Up: peer is eligible for traffic
//! - Down: peer is excluded
//!
//! # State Transitions
//! ```text
//! Down → Up: consecutive successes reach the rise threshold
//! Up → Down: consecutive failures reach the fall threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping; one odd result never flips a peer
//! - Peers start Down and must earn Up (fail closed)
//! - At most one of the two streak counters is ever non-zero

use std::time::{Duration, SystemTime};

use serde::Serialize;

/// Whether a peer may receive traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerStatus {
    Up,
    Down,
}

impl PeerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerStatus::Up => "up",
            PeerStatus::Down => "down",
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, PeerStatus::Up)
    }
}

/// Health record for one peer.
///
/// Counters track the current run: `consecutive_successes` counts the
/// unbroken success streak, `consecutive_failures` the unbroken failure
/// streak, and recording either kind of result zeroes the other. A
/// record where both are non-zero has been corrupted.
#[derive(Debug, Clone)]
pub struct HealthState {
    pub status: PeerStatus,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    /// When the last probe finished, whatever its result.
    pub last_check_at: Option<SystemTime>,
    /// How long the last probe took.
    pub last_latency: Option<Duration>,
    /// Why the last probe failed. Cleared by a success.
    pub last_error: Option<String>,
}

impl HealthState {
    /// Fresh record: Down with zeroed counters.
    pub fn new() -> Self {
        Self {
            status: PeerStatus::Down,
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_check_at: None,
            last_latency: None,
            last_error: None,
        }
    }

    /// Both streak counters non-zero at once. Never produced by the
    /// record methods; seeing it means the record was trampled.
    pub fn is_corrupted(&self) -> bool {
        self.consecutive_successes > 0 && self.consecutive_failures > 0
    }

    /// Zero the record back to its initial Down state.
    pub fn reset(&mut self) {
        *self = HealthState::new();
    }

    /// Record a successful probe. Returns true when this crossed the
    /// rise threshold and flipped the peer Up.
    pub fn record_success(&mut self, rise: u32) -> bool {
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.last_error = None;

        if self.status == PeerStatus::Down && self.consecutive_successes >= rise {
            self.status = PeerStatus::Up;
            return true;
        }
        false
    }

    /// Record a failed probe. Returns true when this crossed the fall
    /// threshold and flipped the peer Down.
    pub fn record_failure(&mut self, fall: u32) -> bool {
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.status == PeerStatus::Up && self.consecutive_failures >= fall {
            self.status = PeerStatus::Down;
            return true;
        }
        false
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
