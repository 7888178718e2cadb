//! SMTP checker: send the configured command, judge the first reply.

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
    let code = parse_reply_code(&line).ok_or(ProbeError::Malformed)?;

    if peer.check.alive_mask.contains_class((code / 100) as u8) {
        Ok(format!("reply {code}"))
    } else {
        Err(ProbeError::ReplyNotAlive(code))
    }
}

/// Pull the reply code out of a line like "220 mail.local ESMTP" or
/// a multiline continuation "250-mail.local".
fn parse_reply_code(line: &str) -> Option<u16> {
    let code: u16 = line.get(..3)?.parse().ok()?;
    if let Some(&sep) = line.as_bytes().get(3) {
        if sep != b' ' && sep != b'-' {
            return None;
        }
    }
    (100..=599).contains(&code).then_some(code)
}
