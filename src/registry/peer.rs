//! Peer and check-parameter types.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ConfigError;

/// Stable handle for one peer, valid for the lifetime of the registry
/// that issued it. Ids are dense and follow registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The protocols a peer can be probed with.
///
/// This set is closed on purpose: adding a protocol means adding a
/// variant and its probe, and the compiler then points at every match
/// that needs a new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckType {
    /// Connect and disconnect, nothing sent.
    Tcp,
    /// Send a request, judge the status line against the alive mask.
    Http,
    /// Send a command, judge the first reply line against the alive mask.
    Smtp,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Tcp => "tcp",
            CheckType::Http => "http",
            CheckType::Smtp => "smtp",
        }
    }

    /// Payload sent when the pool does not configure one.
    pub fn default_send(&self) -> &'static [u8] {
        match self {
            CheckType::Tcp => b"",
            CheckType::Http => b"GET / HTTP/1.0\r\n\r\n",
            CheckType::Smtp => b"HELO smtp.localdomain\r\n",
        }
    }

    /// Alive classes assumed when the pool does not configure a mask.
    pub fn default_alive_mask(&self) -> AliveMask {
        match self {
            CheckType::Tcp => AliveMask::EMPTY,
            CheckType::Http => AliveMask::of_classes(&[2, 3]),
            CheckType::Smtp => AliveMask::of_classes(&[2]),
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(CheckType::Tcp),
            "http" => Ok(CheckType::Http),
            "smtp" => Ok(CheckType::Smtp),
            other => Err(ConfigError::UnknownCheckType(other.to_string())),
        }
    }
}

/// Bitmask of response classes (2xx..5xx) a probe accepts as alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliveMask(u8);

impl AliveMask {
    pub const EMPTY: AliveMask = AliveMask(0);

    /// Build a mask from leading-digit classes, e.g. `&[2, 3]`.
    pub fn of_classes(classes: &[u8]) -> AliveMask {
        let mut bits = 0u8;
        for &class in classes {
            debug_assert!((2..=5).contains(&class));
            bits |= 1 << class;
        }
        AliveMask(bits)
    }

    /// Resolve names like "http_2xx" or "smtp_5xx". `key` is the config
    /// key the names came from, used only in the error.
    pub fn from_names(key: &'static str, names: &[String]) -> Result<AliveMask, ConfigError> {
        let mut bits = 0u8;
        for name in names {
            let class = name
                .strip_prefix("http_")
                .or_else(|| name.strip_prefix("smtp_"))
                .and_then(Self::parse_class)
                .ok_or_else(|| ConfigError::InvalidValue(key, name.clone()))?;
            bits |= 1 << class;
        }
        Ok(AliveMask(bits))
    }

    fn parse_class(suffix: &str) -> Option<u8> {
        let class = match suffix {
            "2xx" => 2,
            "3xx" => 3,
            "4xx" => 4,
            "5xx" => 5,
            _ => return None,
        };
        Some(class)
    }

    /// Whether responses with this leading digit count as alive.
    pub fn contains_class(&self, class: u8) -> bool {
        (2..=5).contains(&class) && self.0 & (1 << class) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AliveMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let mut first = true;
        for class in 2u8..=5 {
            if self.contains_class(class) {
                if !first {
                    f.write_str("|")?;
                }
                write!(f, "{class}xx")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Fully resolved check parameters for one peer.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub check_type: CheckType,
    /// Time between probe starts.
    pub interval: Duration,
    /// Budget for one whole probe (connect, send, read).
    pub timeout: Duration,
    /// Consecutive successes needed to mark a down peer up.
    pub rise: u32,
    /// Consecutive failures needed to mark an up peer down.
    pub fall: u32,
    /// Bytes written after connect. Empty for plain TCP checks.
    pub send: Vec<u8>,
    /// Response classes accepted as alive. Ignored by TCP checks.
    pub alive_mask: AliveMask,
}

impl Default for CheckConfig {
    fn default() -> Self {
        let check_type = CheckType::Http;
        Self {
            check_type,
            interval: Duration::from_millis(30_000),
            timeout: Duration::from_millis(1_000),
            rise: 2,
            fall: 5,
            send: check_type.default_send().to_vec(),
            alive_mask: check_type.default_alive_mask(),
        }
    }
}

/// What a peer is checked as: its address plus the probe protocol.
/// Two registry entries with the same identity would race each other,
/// so identities are unique within a registry.
pub type PeerIdentity = (SocketAddr, CheckType);

/// One registered peer.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    /// Name of the pool this peer belongs to.
    pub upstream: String,
    pub addr: SocketAddr,
    pub check: CheckConfig,
}

impl Peer {
    pub fn identity(&self) -> PeerIdentity {
        (self.addr, self.check.check_type)
    }
}

/// Raw material for one registry entry, as it comes out of the config.
/// Strings are still unresolved; `Registry::build` turns them into a
/// `Peer` or fails with a `ConfigError`.
#[derive(Debug, Clone)]
pub struct PeerSpec {
    pub upstream: String,
    pub server: String,
    pub check_type: String,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub rise: u32,
    pub fall: u32,
    pub send: Option<Vec<u8>>,
    pub alive_mask: Option<AliveMask>,
}
