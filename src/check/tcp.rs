//! TCP checker: a completed connect is the whole probe.

use crate::check::{self, ProbeError};
use crate::registry::Peer;

pub(super) async fn probe(peer: &Peer) -> Result<String, ProbeError> {
    let stream = check::connect(peer).await?;
    drop(stream);
    Ok("connected".to_string())
}
