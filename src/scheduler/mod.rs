//! Probe scheduler.
//!
//! One task per peer. Each task sleeps a random fraction of its
//! interval first, so a freshly loaded config does not probe every
//! peer at the same instant, then ticks at the configured interval.
//! The probe is awaited inline, which makes at-most-one-in-flight per
//! peer structural: a slow probe delays the next tick, and missed
//! ticks are skipped rather than run as a burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::check;
use crate::health::HealthStore;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::{PeerId, Registry};

/// Spawns and owns the probe tasks for one registry generation.
pub struct Scheduler {
    registry: Arc<Registry>,
    store: Arc<HealthStore>,
}

impl Scheduler {
    pub fn new(registry: Arc<Registry>, store: Arc<HealthStore>) -> Self {
        Self { registry, store }
    }

    /// Spawn one probe task per registered peer.
    pub fn start(self) -> SchedulerHandle {
        let shutdown = Shutdown::new();
        let mut tasks = Vec::with_capacity(self.registry.len());

        for id in self.registry.ids() {
            let rx = shutdown.subscribe();
            tasks.push(tokio::spawn(peer_loop(
                self.registry.clone(),
                self.store.clone(),
                id,
                rx,
            )));
        }

        tracing::info!(peers = self.registry.len(), "check scheduler started");
        SchedulerHandle { shutdown, tasks }
    }
}

/// Handle to a running scheduler generation.
pub struct SchedulerHandle {
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop all probe tasks and wait for them to finish. A probe in
    /// flight completes and records its outcome before its task exits.
    pub async fn stop(self) {
        self.shutdown.trigger();
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::debug!("check scheduler stopped");
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

async fn peer_loop(
    registry: Arc<Registry>,
    store: Arc<HealthStore>,
    id: PeerId,
    mut shutdown: broadcast::Receiver<()>,
) {
    let peer = registry.get(id).clone();
    let interval_ms = peer.check.interval.as_millis() as u64;

    // initial offset in [0, interval)
    let jitter = Duration::from_millis(fastrand::u64(0..interval_ms.max(1)));
    tokio::select! {
        _ = time::sleep(jitter) => {}
        _ = shutdown.recv() => return,
    }

    let mut ticker = time::interval(peer.check.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = check::probe(&peer).await;
                if outcome.success {
                    tracing::debug!(
                        upstream = %peer.upstream,
                        peer = %peer.addr,
                        latency_ms = outcome.latency.as_millis() as u64,
                        detail = %outcome.detail,
                        "check succeeded"
                    );
                } else {
                    tracing::warn!(
                        upstream = %peer.upstream,
                        peer = %peer.addr,
                        detail = %outcome.detail,
                        "check failed"
                    );
                }

                metrics::record_check(&peer.upstream, outcome.success, outcome.latency);
                store.apply(&peer, &outcome);
                metrics::record_peer_alive(
                    &peer.upstream,
                    &peer.addr.to_string(),
                    store.is_alive(id),
                );
            }
            _ = shutdown.recv() => break,
        }
    }
}
