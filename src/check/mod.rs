//! Protocol checkers.
//!
//! One probe is one connection: connect, optionally send the
//! configured payload, read the first reply line, classify. The peer's
//! timeout covers the whole sequence, and every exit path closes the
//! connection.
//!
//! The checker set is a closed enum ([`CheckType`]); dispatch is
//! a single match in [`probe`].

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;

use crate::registry::{CheckType, Peer, PeerId};

mod http;
mod smtp;
mod tcp;

/// Replies are judged by their first line; anything past this many
/// bytes without a newline is malformed.
const MAX_REPLY_BYTES: usize = 512;

/// Result of one probe against one peer.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub peer: PeerId,
    pub success: bool,
    /// Wall time from probe start to verdict.
    pub latency: Duration,
    /// Human-readable verdict: "status 200", "connect failed: ...",
    /// or the literal "timeout".
    pub detail: String,
}

/// Why a probe failed, short of timing out.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// TCP connect did not complete.
    #[error("connect failed: {0}")]
    Connect(std::io::Error),

    /// Writing the probe payload failed.
    #[error("send failed: {0}")]
    Send(std::io::Error),

    /// Reading the reply failed.
    #[error("read failed: {0}")]
    Read(std::io::Error),

    /// The reply had no parsable status/reply line.
    #[error("malformed response")]
    Malformed,

    /// HTTP status parsed but its class is not in the alive mask.
    #[error("status {0} not allowed by expect_alive")]
    StatusNotAlive(u16),

    /// SMTP reply parsed but its class is not in the alive mask.
    #[error("reply {0} not allowed by expect_alive")]
    ReplyNotAlive(u16),
}

/// Run one probe against a peer, honoring its configured timeout.
///
/// Never takes longer than the peer's timeout; a probe that does is
/// cut off and reported with the literal detail "timeout".
pub async fn probe(peer: &Peer) -> CheckOutcome {
    let started = Instant::now();
    let result = time::timeout(peer.check.timeout, dispatch(peer)).await;
    let latency = started.elapsed();

    match result {
        Ok(Ok(detail)) => CheckOutcome {
            peer: peer.id,
            success: true,
            latency,
            detail,
        },
        Ok(Err(err)) => CheckOutcome {
            peer: peer.id,
            success: false,
            latency,
            detail: err.to_string(),
        },
        Err(_) => CheckOutcome {
            peer: peer.id,
            success: false,
            latency,
            detail: "timeout".to_string(),
        },
    }
}

async fn dispatch(peer: &Peer) -> Result<String, ProbeError> {
    match peer.check.check_type {
        CheckType::Tcp => tcp::probe(peer).await,
        CheckType::Http => http::probe(peer).await,
        CheckType::Smtp => smtp::probe(peer).await,
    }
}

pub(crate) async fn connect(peer: &Peer) -> Result<TcpStream, ProbeError> {
    TcpStream::connect(peer.addr).await.map_err(ProbeError::Connect)
}

/// Read up to the first newline, capped at [`MAX_REPLY_BYTES`], and
/// return that line without its trailing CR.
pub(crate) async fn read_reply_line(stream: &mut TcpStream) -> Result<String, ProbeError> {
    let mut buf = Vec::with_capacity(256);
    let mut chunk = [0u8; 256];

    loop {
        let n = stream.read(&mut chunk).await.map_err(ProbeError::Read)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.contains(&b'\n') || buf.len() >= MAX_REPLY_BYTES {
            break;
        }
    }

    let end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let line = String::from_utf8_lossy(&buf[..end]);
    Ok(line.trim_end_matches('\r').to_string())
}
