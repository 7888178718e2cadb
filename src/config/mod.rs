//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → UpcheckConfig (validated, immutable)
//!     → resolved into a peer registry by the engine
//!
//! On reload:
//!     watcher.rs detects change (or SIGHUP forces one)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → engine rebuilds registry and state, carrying health over
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Check attributes ride in one string per pool and are resolved
//!   against the known checker set at registry build time

pub mod directive;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ObservabilityConfig, StatusConfig, UpcheckConfig, UpstreamConfig};
pub use watcher::ConfigWatcher;
