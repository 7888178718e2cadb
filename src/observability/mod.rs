//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler and store produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic updates behind the facade)
//! - Both sinks are optional; checking runs fine without either

pub mod logging;
pub mod metrics;
