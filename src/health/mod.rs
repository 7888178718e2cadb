//! Health state subsystem.
//!
//! # Data Flow
//! ```text
//! Probe outcome (from a scheduler task)
//!     → store.rs folds it into the peer's record
//!     → state.rs applies the rise/fall hysteresis
//!     → transition? logged, visible to is_alive() and the status report
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive successes/failures
//! - Health state is per-peer, not per-pool
//! - Readers never see a record mid-update; the store locks per record

pub mod state;
pub mod store;

pub use state::{HealthState, PeerStatus};
pub use store::{HealthStore, PeerHealth, RECORD_FOOTPRINT};
