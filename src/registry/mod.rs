//! Peer registry: the immutable set of peers under active checking.
//!
//! Built once per configuration load. Every peer gets a dense
//! [`PeerId`] in registration order (config file order), and the id
//! stays valid for as long as the registry it came from. A reload
//! builds a fresh registry; continuity across the two is by peer
//! identity, not by id.

pub mod peer;

use std::collections::HashMap;

use crate::config::{ConfigError, UpcheckConfig};

pub use peer::{AliveMask, CheckConfig, CheckType, Peer, PeerId, PeerIdentity, PeerSpec};

/// Immutable peer set for one configuration generation.
#[derive(Debug)]
pub struct Registry {
    peers: Vec<Peer>,
    by_identity: HashMap<PeerIdentity, PeerId>,
}

impl Registry {
    /// Expand a validated configuration into peer specs and build.
    pub fn from_config(config: &UpcheckConfig) -> Result<Self, ConfigError> {
        let mut specs = Vec::new();

        for upstream in &config.upstreams {
            let directive = upstream.check_directive()?;
            let send = upstream.probe_send()?.map(|s| s.as_bytes().to_vec());
            let alive_mask = match upstream.expect_alive()? {
                Some((key, names)) => Some(AliveMask::from_names(key, names)?),
                None => None,
            };
            let check_type = directive
                .check_type
                .clone()
                .unwrap_or_else(|| "http".to_string());

            for server in &upstream.servers {
                specs.push(PeerSpec {
                    upstream: upstream.name.clone(),
                    server: server.clone(),
                    check_type: check_type.clone(),
                    interval_ms: directive.interval_ms,
                    timeout_ms: directive.timeout_ms,
                    rise: directive.rise,
                    fall: directive.fall,
                    send: send.clone(),
                    alive_mask,
                });
            }
        }

        Self::build(specs)
    }

    /// Resolve peer specs into a registry.
    ///
    /// Fails when a check type name is unrecognized, a server address
    /// does not parse, a threshold or period is zero, or two specs
    /// share an identity.
    pub fn build(specs: Vec<PeerSpec>) -> Result<Self, ConfigError> {
        let mut peers = Vec::with_capacity(specs.len());
        let mut by_identity = HashMap::with_capacity(specs.len());

        for spec in specs {
            let check_type: CheckType = spec.check_type.parse()?;
            let addr = spec
                .server
                .parse()
                .map_err(|e: std::net::AddrParseError| {
                    ConfigError::InvalidServerAddress(spec.server.clone(), e.to_string())
                })?;

            if spec.interval_ms == 0 {
                return Err(ConfigError::InvalidValue("interval", "0".to_string()));
            }
            if spec.timeout_ms == 0 {
                return Err(ConfigError::InvalidValue("timeout", "0".to_string()));
            }
            if spec.rise == 0 {
                return Err(ConfigError::InvalidValue("rise", "0".to_string()));
            }
            if spec.fall == 0 {
                return Err(ConfigError::InvalidValue("fall", "0".to_string()));
            }
            if spec.timeout_ms > spec.interval_ms {
                tracing::warn!(
                    upstream = %spec.upstream,
                    server = %spec.server,
                    timeout_ms = spec.timeout_ms,
                    interval_ms = spec.interval_ms,
                    "check timeout exceeds interval; probes will run back to back"
                );
            }

            let check = CheckConfig {
                check_type,
                interval: std::time::Duration::from_millis(spec.interval_ms),
                timeout: std::time::Duration::from_millis(spec.timeout_ms),
                rise: spec.rise,
                fall: spec.fall,
                send: spec
                    .send
                    .unwrap_or_else(|| check_type.default_send().to_vec()),
                alive_mask: spec
                    .alive_mask
                    .unwrap_or_else(|| check_type.default_alive_mask()),
            };

            let id = PeerId(peers.len() as u32);
            let peer = Peer {
                id,
                upstream: spec.upstream,
                addr,
                check,
            };

            if by_identity.insert(peer.identity(), id).is_some() {
                return Err(ConfigError::DuplicatePeer(format!(
                    "{addr} ({check_type})"
                )));
            }
            peers.push(peer);
        }

        Ok(Self { peers, by_identity })
    }

    /// Look up a peer by id. Ids issued by this registry are always
    /// in bounds.
    pub fn get(&self, id: PeerId) -> &Peer {
        &self.peers[id.0 as usize]
    }

    /// Find the id carrying a given identity, if registered.
    pub fn find(&self, identity: &PeerIdentity) -> Option<PeerId> {
        self.by_identity.get(identity).copied()
    }

    /// All peers in registration order.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// All ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = PeerId> + '_ {
        (0..self.peers.len() as u32).map(PeerId)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
