//! Active health checking for upstream peer pools.
//!
//! Peers are probed on their own timers (tcp, http or smtp), probe
//! outcomes feed a rise/fall hysteresis state machine, and the
//! resulting up/down verdicts are served to the traffic path through
//! [`Engine::is_alive`] and to operators through the status endpoint.

pub mod check;
pub mod config;
pub mod engine;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod scheduler;
pub mod status;

pub use config::{load_config, ConfigError, UpcheckConfig};
pub use engine::{Engine, Monitor};
pub use health::{HealthState, HealthStore, PeerHealth, PeerStatus};
pub use lifecycle::Shutdown;
pub use registry::{CheckType, Peer, PeerId, Registry};
pub use scheduler::{Scheduler, SchedulerHandle};
