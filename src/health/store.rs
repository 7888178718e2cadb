//! Concurrent health state store.
//!
//! One record per registered peer, held in a sharded map so readers on
//! the request path and the probe tasks writing results contend only
//! per shard, never globally. A writer holds a record for exactly one
//! update; readers see each record either before or after an update,
//! never mid-way through.

use std::time::SystemTime;

use dashmap::DashMap;

use crate::check::CheckOutcome;
use crate::config::ConfigError;
use crate::health::state::{HealthState, PeerStatus};
use crate::registry::{Peer, PeerId, Registry};

/// Nominal footprint of one health record, used to turn the configured
/// state region size into a peer capacity.
pub const RECORD_FOOTPRINT: usize = 128;

/// Answer to a health query from the traffic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerHealth {
    pub status: PeerStatus,
    pub last_check_at: Option<SystemTime>,
}

/// Health records for every peer of one registry generation.
#[derive(Debug)]
pub struct HealthStore {
    records: DashMap<PeerId, HealthState>,
    capacity: usize,
}

impl HealthStore {
    /// Create a store sized by the configured state region, seeded
    /// with a Down record per peer.
    ///
    /// Fails when the region cannot hold the registered peer count.
    pub fn new(registry: &Registry, region_bytes: u64) -> Result<Self, ConfigError> {
        let capacity = (region_bytes / RECORD_FOOTPRINT as u64) as usize;
        if registry.len() > capacity {
            return Err(ConfigError::StateRegionTooSmall {
                capacity,
                configured: registry.len(),
            });
        }

        let records = DashMap::with_capacity(registry.len());
        for id in registry.ids() {
            records.insert(id, HealthState::new());
        }

        Ok(Self { records, capacity })
    }

    /// Fold one probe outcome into the peer's record.
    ///
    /// Returns the new status when the outcome crossed a threshold and
    /// flipped the peer, `None` otherwise. Outcomes for ids this store
    /// does not know (stale results from before a reload) are dropped.
    pub fn apply(&self, peer: &Peer, outcome: &CheckOutcome) -> Option<PeerStatus> {
        let mut record = match self.records.get_mut(&outcome.peer) {
            Some(record) => record,
            None => {
                tracing::debug!(peer = %outcome.peer, "dropping outcome for unknown peer");
                return None;
            }
        };

        if record.is_corrupted() {
            tracing::error!(
                upstream = %peer.upstream,
                peer = %peer.addr,
                successes = record.consecutive_successes,
                failures = record.consecutive_failures,
                "corrupted health record, resetting to down"
            );
            record.reset();
        }

        record.last_check_at = Some(SystemTime::now());
        record.last_latency = Some(outcome.latency);

        let flipped = if outcome.success {
            record.record_success(peer.check.rise)
        } else {
            record.last_error = Some(outcome.detail.clone());
            record.record_failure(peer.check.fall)
        };

        if flipped {
            tracing::info!(
                upstream = %peer.upstream,
                peer = %peer.addr,
                check = %peer.check.check_type,
                status = record.status.as_str(),
                "peer state changed"
            );
            Some(record.status)
        } else {
            None
        }
    }

    /// Status and last-check time for one peer.
    pub fn query(&self, id: PeerId) -> Option<PeerHealth> {
        self.records.get(&id).map(|record| PeerHealth {
            status: record.status,
            last_check_at: record.last_check_at,
        })
    }

    /// Whether a peer may receive traffic. Unknown ids are down.
    pub fn is_alive(&self, id: PeerId) -> bool {
        self.records
            .get(&id)
            .map(|record| record.status.is_up())
            .unwrap_or(false)
    }

    /// Clone of the full record, for reporting.
    pub fn state_of(&self, id: PeerId) -> Option<HealthState> {
        self.records.get(&id).map(|record| record.clone())
    }

    /// Carry health over from the previous generation: every peer that
    /// keeps its identity keeps its record, streaks included. New
    /// peers stay at their seeded Down record.
    pub fn carry_over(&self, prev: &HealthStore, prev_registry: &Registry, registry: &Registry) {
        let mut carried = 0usize;
        for peer in registry.peers() {
            if let Some(prev_id) = prev_registry.find(&peer.identity()) {
                if let Some(state) = prev.state_of(prev_id) {
                    self.records.insert(peer.id, state);
                    carried += 1;
                }
            }
        }
        tracing::debug!(
            carried,
            total = registry.len(),
            "health records carried over"
        );
    }

    /// Peers the configured state region can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PeerSpec;
    use std::time::Duration;

    fn registry_of(servers: &[(&str, &str)]) -> Registry {
        let specs = servers
            .iter()
            .map(|(server, check_type)| PeerSpec {
                upstream: "web".to_string(),
                server: server.to_string(),
                check_type: check_type.to_string(),
                interval_ms: 1000,
                timeout_ms: 500,
                rise: 2,
                fall: 3,
                send: None,
                alive_mask: None,
            })
            .collect();
        Registry::build(specs).unwrap()
    }

    fn outcome(id: PeerId, success: bool) -> CheckOutcome {
        CheckOutcome {
            peer: id,
            success,
            latency: Duration::from_millis(3),
            detail: if success {
                "status 200".to_string()
            } else {
                "timeout".to_string()
            },
        }
    }

    #[test]
    fn test_new_seeds_down_records() {
        let registry = registry_of(&[("127.0.0.1:8081", "http"), ("127.0.0.1:8082", "http")]);
        let store = HealthStore::new(&registry, 1024 * 1024).unwrap();

        assert_eq!(store.len(), 2);
        assert!(!store.is_alive(PeerId(0)));
        assert_eq!(store.query(PeerId(0)).unwrap().status, PeerStatus::Down);
        assert!(store.query(PeerId(0)).unwrap().last_check_at.is_none());
    }

    #[test]
    fn test_region_too_small() {
        let registry = registry_of(&[("127.0.0.1:8081", "http"), ("127.0.0.1:8082", "http")]);
        let err = HealthStore::new(&registry, RECORD_FOOTPRINT as u64).unwrap_err();
        assert!(
            matches!(err, ConfigError::StateRegionTooSmall { capacity: 1, configured: 2 })
        );
    }

    #[test]
    fn test_apply_rise_then_fall() {
        let registry = registry_of(&[("127.0.0.1:8081", "http")]);
        let store = HealthStore::new(&registry, 1024 * 1024).unwrap();
        let peer = registry.get(PeerId(0));

        assert_eq!(store.apply(peer, &outcome(peer.id, true)), None);
        assert!(!store.is_alive(peer.id));
        assert_eq!(
            store.apply(peer, &outcome(peer.id, true)),
            Some(PeerStatus::Up)
        );
        assert!(store.is_alive(peer.id));

        assert_eq!(store.apply(peer, &outcome(peer.id, false)), None);
        assert_eq!(store.apply(peer, &outcome(peer.id, false)), None);
        assert_eq!(
            store.apply(peer, &outcome(peer.id, false)),
            Some(PeerStatus::Down)
        );
        assert!(!store.is_alive(peer.id));
        assert_eq!(
            store.state_of(peer.id).unwrap().last_error.as_deref(),
            Some("timeout")
        );
    }

    #[test]
    fn test_query_without_new_outcomes_is_stable() {
        let registry = registry_of(&[("127.0.0.1:8081", "http")]);
        let store = HealthStore::new(&registry, 1024 * 1024).unwrap();
        let peer = registry.get(PeerId(0));
        store.apply(peer, &outcome(peer.id, true));

        let first = store.query(peer.id).unwrap();
        let second = store.query(peer.id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_id_is_down_and_dropped() {
        let registry = registry_of(&[("127.0.0.1:8081", "http")]);
        let store = HealthStore::new(&registry, 1024 * 1024).unwrap();
        let peer = registry.get(PeerId(0));

        assert!(!store.is_alive(PeerId(42)));
        assert!(store.query(PeerId(42)).is_none());
        assert_eq!(store.apply(peer, &outcome(PeerId(42), true)), None);
    }

    #[test]
    fn test_corrupted_record_resets_before_applying() {
        let registry = registry_of(&[("127.0.0.1:8081", "http")]);
        let store = HealthStore::new(&registry, 1024 * 1024).unwrap();
        let peer = registry.get(PeerId(0));

        if let Some(mut record) = store.records.get_mut(&peer.id) {
            record.consecutive_successes = 3;
            record.consecutive_failures = 9;
        }

        store.apply(peer, &outcome(peer.id, true));
        let state = store.state_of(peer.id).unwrap();
        assert!(!state.is_corrupted());
        // reset discarded the trampled streaks; this success is the first
        assert_eq!(state.consecutive_successes, 1);
        assert_eq!(state.status, PeerStatus::Down);
    }

    #[test]
    fn test_carry_over_by_identity() {
        let old_registry = registry_of(&[("127.0.0.1:8081", "http"), ("127.0.0.1:8082", "http")]);
        let old_store = HealthStore::new(&old_registry, 1024 * 1024).unwrap();
        let first = old_registry.get(PeerId(0));
        old_store.apply(first, &outcome(first.id, true));
        old_store.apply(first, &outcome(first.id, true));
        assert!(old_store.is_alive(first.id));

        // 8082 dropped, 8083 added; 8081 keeps its identity but moves ids
        let new_registry = registry_of(&[("127.0.0.1:8083", "http"), ("127.0.0.1:8081", "http")]);
        let new_store = HealthStore::new(&new_registry, 1024 * 1024).unwrap();
        new_store.carry_over(&old_store, &old_registry, &new_registry);

        assert!(new_store.is_alive(PeerId(1)));
        assert_eq!(
            new_store.state_of(PeerId(1)).unwrap().consecutive_successes,
            2
        );
        assert!(!new_store.is_alive(PeerId(0)));
    }

    #[test]
    fn test_carry_over_requires_same_check_type() {
        let old_registry = registry_of(&[("127.0.0.1:8081", "http")]);
        let old_store = HealthStore::new(&old_registry, 1024 * 1024).unwrap();
        let peer = old_registry.get(PeerId(0));
        old_store.apply(peer, &outcome(peer.id, true));
        old_store.apply(peer, &outcome(peer.id, true));

        let new_registry = registry_of(&[("127.0.0.1:8081", "tcp")]);
        let new_store = HealthStore::new(&new_registry, 1024 * 1024).unwrap();
        new_store.carry_over(&old_store, &old_registry, &new_registry);

        // same address probed differently starts from scratch
        assert!(!new_store.is_alive(PeerId(0)));
    }
}
