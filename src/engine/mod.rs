//! Engine: one resolved configuration generation, and the monitor
//! that runs generations and swaps them on reload.
//!
//! # Data Flow
//! ```text
//! UpcheckConfig
//!     → Engine::build (registry + seeded health store)
//!     → Monitor::run starts a scheduler for it
//!
//! On config update:
//!     Engine::rebuild (carries health over by peer identity)
//!     → old scheduler stopped and joined
//!     → engine swapped, new scheduler started
//!     → on any build error the old generation keeps running
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::config::{ConfigError, UpcheckConfig};
use crate::health::{HealthStore, PeerHealth};
use crate::registry::{PeerId, Registry};
use crate::scheduler::Scheduler;

/// Immutable bundle of registry and health store for one generation.
#[derive(Debug)]
pub struct Engine {
    pub registry: Arc<Registry>,
    pub store: Arc<HealthStore>,
    /// Counts configuration loads, starting at 1.
    pub generation: u64,
}

impl Engine {
    /// Resolve a validated config into a runnable engine.
    pub fn build(config: &UpcheckConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(Registry::from_config(config)?);
        let store = Arc::new(HealthStore::new(&registry, config.state_size_bytes()?)?);
        Ok(Self {
            registry,
            store,
            generation: 1,
        })
    }

    /// Build the next generation from a new config. Peers that keep
    /// their identity keep their health, streaks included; everything
    /// else starts Down.
    pub fn rebuild(&self, config: &UpcheckConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(Registry::from_config(config)?);
        let store = Arc::new(HealthStore::new(&registry, config.state_size_bytes()?)?);
        store.carry_over(&self.store, &self.registry, &registry);
        Ok(Self {
            registry,
            store,
            generation: self.generation + 1,
        })
    }

    /// Whether a peer may receive traffic. This is the call the
    /// traffic path makes per candidate peer.
    pub fn is_alive(&self, id: PeerId) -> bool {
        self.store.is_alive(id)
    }

    /// Status and last-check time for one peer.
    pub fn query(&self, id: PeerId) -> Option<PeerHealth> {
        self.store.query(id)
    }
}

/// Owns the live engine pointer and the scheduler of the current
/// generation.
pub struct Monitor {
    engine: Arc<ArcSwap<Engine>>,
}

impl Monitor {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
        }
    }

    /// Shared handle for readers (status endpoint, traffic path).
    /// Loads are lock-free; a reload swaps the pointer underneath.
    pub fn shared(&self) -> Arc<ArcSwap<Engine>> {
        self.engine.clone()
    }

    /// Run until shutdown fires or the update channel closes.
    ///
    /// Each accepted update stops the old generation's probe tasks
    /// completely before the new generation starts, so two schedulers
    /// never probe the same peer concurrently.
    pub async fn run(
        self,
        mut config_updates: mpsc::UnboundedReceiver<UpcheckConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let current = self.engine.load_full();
        let mut scheduler = Scheduler::new(current.registry.clone(), current.store.clone()).start();

        loop {
            tokio::select! {
                update = config_updates.recv() => {
                    let Some(config) = update else {
                        tracing::debug!("config update channel closed");
                        break;
                    };
                    let current = self.engine.load_full();
                    match current.rebuild(&config) {
                        Ok(next) => {
                            scheduler.stop().await;
                            let next = Arc::new(next);
                            self.engine.store(next.clone());
                            scheduler = Scheduler::new(
                                next.registry.clone(),
                                next.store.clone(),
                            )
                            .start();
                            tracing::info!(
                                generation = next.generation,
                                peers = next.registry.len(),
                                "configuration reloaded"
                            );
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "reload failed, keeping current configuration"
                            );
                        }
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        scheduler.stop().await;
        tracing::info!("monitor stopped");
    }
}
