//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upcheck_checks_total` (counter): probes by upstream and result
//! - `upcheck_check_duration_seconds` (histogram): probe latency
//! - `upcheck_peer_up` (gauge): 1=up, 0=down, per peer
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; exposition is a
//!   Prometheus scrape endpoint installed at startup
//! - Recording before `init_metrics` is a no-op, so probe code never
//!   cares whether the exporter is enabled

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Failure is logged and otherwise ignored; checking works the same
/// without an exporter.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to install metrics exporter");
        }
    }
}

fn describe_metrics() {
    describe_counter!(
        "upcheck_checks_total",
        "Probe outcomes by upstream and result"
    );
    describe_histogram!(
        "upcheck_check_duration_seconds",
        Unit::Seconds,
        "Probe latency from start to verdict"
    );
    describe_gauge!("upcheck_peer_up", "Peer health (1 up, 0 down)");
}

/// Count one probe and record its latency.
pub fn record_check(upstream: &str, success: bool, latency: Duration) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "upcheck_checks_total",
        "upstream" => upstream.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!(
        "upcheck_check_duration_seconds",
        "upstream" => upstream.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Publish a peer's current verdict.
pub fn record_peer_alive(upstream: &str, peer: &str, alive: bool) {
    gauge!(
        "upcheck_peer_up",
        "upstream" => upstream.to_string(),
        "peer" => peer.to_string()
    )
    .set(if alive { 1.0 } else { 0.0 });
}
