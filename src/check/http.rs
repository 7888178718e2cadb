//! HTTP checker: send the configured request, judge the status line.

use tokio::io::AsyncWriteExt;

use crate::check::{self, ProbeError};
use crate::registry::Peer;

pub(super) async fn probe(peer: &Peer) -> Result<String, ProbeError> {
    let mut stream = check::connect(peer).await?;
    stream
        .write_all(&peer.check.send)
        .await
        .map_err(ProbeError::Send)?;

    let line = check::read_reply_line(&mut stream).await?;
    let status = parse_status_line(&line).ok_or(ProbeError::Malformed)?;

    if peer.check.alive_mask.contains_class((status / 100) as u8) {
        Ok(format!("status {status}"))
    } else {
        Err(ProbeError::StatusNotAlive(status))
    }
}

/// Pull the status code out of a status line like "HTTP/1.1 200 OK".
fn parse_status_line(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("HTTP/")?;
    let mut fields = rest.split_whitespace();
    let _version = fields.next()?;
    let code: u16 = fields.next()?.parse().ok()?;
    (100..=599).contains(&code).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_line() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_line("HTTP/1.0 503 Service Unavailable"), Some(503));
        // reason phrase is optional
        assert_eq!(parse_status_line("HTTP/1.1 204"), Some(204));
    }

    #[test]
    fn test_parse_status_line_rejects_garbage() {
        assert_eq!(parse_status_line(""), None);
        assert_eq!(parse_status_line("HTTP/1.1"), None);
        assert_eq!(parse_status_line("HTTP/1.1 abc OK"), None);
        assert_eq!(parse_status_line("SSH-2.0-OpenSSH_9.6"), None);
        // out of the status code range
        assert_eq!(parse_status_line("HTTP/1.1 999 Nope"), None);
        assert_eq!(parse_status_line("HTTP/1.1 42 Nope"), None);
    }
}
