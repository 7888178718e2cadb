//! Status report assembly and rendering.

use serde::Serialize;

use crate::engine::Engine;
use crate::health::PeerStatus;

/// One peer's line in the report.
#[derive(Debug, Clone, Serialize)]
pub struct PeerRow {
    pub index: u32,
    pub upstream: String,
    /// Peer address as configured.
    pub name: String,
    pub status: PeerStatus,
    /// Current consecutive-success streak.
    pub rise: u32,
    /// Current consecutive-failure streak.
    pub fall: u32,
    pub check_type: &'static str,
    /// Milliseconds since the last probe finished.
    pub last_check_ms: Option<u64>,
    pub last_latency_ms: Option<u64>,
    pub last_error: Option<String>,
}

/// Snapshot of every registered peer, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generation: u64,
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub peers: Vec<PeerRow>,
}

/// Build the report in registration order.
///
/// Each record is read under its own lock, so the report is
/// row-consistent rather than a global freeze; probing continues
/// while it is built.
pub fn build_report(engine: &Engine) -> StatusReport {
    let mut peers = Vec::with_capacity(engine.registry.len());
    let mut up = 0usize;

    for peer in engine.registry.peers() {
        let state = engine.store.state_of(peer.id).unwrap_or_default();
        if state.status.is_up() {
            up += 1;
        }
        peers.push(PeerRow {
            index: peer.id.0,
            upstream: peer.upstream.clone(),
            name: peer.addr.to_string(),
            status: state.status,
            rise: state.consecutive_successes,
            fall: state.consecutive_failures,
            check_type: peer.check.check_type.as_str(),
            last_check_ms: state
                .last_check_at
                .and_then(|at| at.elapsed().ok())
                .map(|since| since.as_millis() as u64),
            last_latency_ms: state.last_latency.map(|d| d.as_millis() as u64),
            last_error: state.last_error.clone(),
        });
    }

    let total = peers.len();
    StatusReport {
        generation: engine.generation,
        total,
        up,
        down: total - up,
        peers,
    }
}

/// Render the report as a plain HTML table.
pub fn render_html(report: &StatusReport) -> String {
    let mut html = String::with_capacity(1024 + report.peers.len() * 256);
    html.push_str(
        "<!DOCTYPE html>\n<html>\n<head><title>Upstream Check Status</title></head>\n<body>\n",
    );
    html.push_str("<h1>Upstream Check Status</h1>\n");
    html.push_str(&format!(
        "<p>check upstream server number: {}, generation: {}, up: {}, down: {}</p>\n",
        report.total, report.generation, report.up, report.down
    ));
    html.push_str("<table border=\"1\" cellspacing=\"0\" cellpadding=\"3\">\n");
    html.push_str(
        "<tr><th>Index</th><th>Upstream</th><th>Name</th><th>Status</th>\
         <th>Rise counts</th><th>Fall counts</th><th>Check type</th>\
         <th>Last check</th><th>Last error</th></tr>\n",
    );

    for row in &report.peers {
        let last_check = row
            .last_check_ms
            .map(|ms| format!("{ms}ms ago"))
            .unwrap_or_else(|| "-".to_string());
        let last_error = row.last_error.as_deref().unwrap_or("-");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.index,
            escape_html(&row.upstream),
            row.name,
            row.status.as_str(),
            row.rise,
            row.fall,
            row.check_type,
            last_check,
            escape_html(last_error),
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Render the report as CSV, one line per peer.
pub fn render_csv(report: &StatusReport) -> String {
    let mut csv = String::with_capacity(64 + report.peers.len() * 64);
    csv.push_str("index,upstream,name,status,rise,fall,check_type,last_check_ms\n");
    for row in &report.peers {
        let last_check = row
            .last_check_ms
            .map(|ms| ms.to_string())
            .unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            row.index,
            row.upstream,
            row.name,
            row.status.as_str(),
            row.rise,
            row.fall,
            row.check_type,
            last_check,
        ));
    }
    csv
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckOutcome;
    use crate::config::UpcheckConfig;
    use crate::registry::PeerId;
    use std::time::Duration;

    fn test_engine() -> Engine {
        let config: UpcheckConfig = toml::from_str(
            r#"
[[upstreams]]
name = "web"
servers = ["127.0.0.1:8081", "127.0.0.1:8082"]
check = "type=http interval=1000 timeout=500 rise=1 fall=1"

[[upstreams]]
name = "mail"
servers = ["127.0.0.1:2525"]
check = "type=smtp"
"#,
        )
        .unwrap();
        Engine::build(&config).unwrap()
    }

    fn mark_up(engine: &Engine, id: PeerId) {
        let peer = engine.registry.get(id).clone();
        engine.store.apply(
            &peer,
            &CheckOutcome {
                peer: id,
                success: true,
                latency: Duration::from_millis(2),
                detail: "status 200".to_string(),
            },
        );
    }

    #[test]
    fn test_report_follows_registration_order() {
        let engine = test_engine();
        mark_up(&engine, PeerId(1));

        let report = build_report(&engine);
        assert_eq!(report.generation, 1);
        assert_eq!(report.total, 3);
        assert_eq!(report.up, 1);
        assert_eq!(report.down, 2);

        let indices: Vec<_> = report.peers.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(report.peers[0].upstream, "web");
        assert_eq!(report.peers[2].upstream, "mail");
        assert_eq!(report.peers[2].check_type, "smtp");
        assert_eq!(report.peers[1].status, PeerStatus::Up);
        assert_eq!(report.peers[1].rise, 1);
    }

    #[test]
    fn test_unchecked_peer_has_no_timestamps() {
        let engine = test_engine();
        let report = build_report(&engine);
        assert_eq!(report.peers[0].last_check_ms, None);
        assert_eq!(report.peers[0].last_latency_ms, None);
        assert_eq!(report.peers[0].last_error, None);
    }

    #[test]
    fn test_html_contains_summary_and_rows() {
        let engine = test_engine();
        mark_up(&engine, PeerId(0));

        let html = render_html(&build_report(&engine));
        assert!(html.contains("<title>Upstream Check Status</title>"));
        assert!(html.contains("check upstream server number: 3"));
        assert!(html.contains("<td>127.0.0.1:8081</td>"));
        assert!(html.contains("<td>up</td>"));
        assert!(html.contains("<td>down</td>"));
    }

    #[test]
    fn test_html_escapes_error_detail() {
        let engine = test_engine();
        let peer = engine.registry.get(PeerId(0)).clone();
        engine.store.apply(
            &peer,
            &CheckOutcome {
                peer: peer.id,
                success: false,
                latency: Duration::from_millis(2),
                detail: "<script>alert(1)</script>".to_string(),
            },
        );

        let html = render_html(&build_report(&engine));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_csv_shape() {
        let engine = test_engine();
        let csv = render_csv(&build_report(&engine));
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "index,upstream,name,status,rise,fall,check_type,last_check_ms"
        );
        assert!(lines[1].starts_with("0,web,127.0.0.1:8081,down,0,0,http,"));
    }
}
