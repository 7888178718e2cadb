//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::UpcheckConfig;
use crate::config::validation::validate_config;

/// Errors raised while loading or resolving configuration.
///
/// Everything here is fatal to config load: the previous configuration
/// (if any) stays in effect when one of these comes back.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML (including repeated keys).
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `check` attribute token is unknown or has an unparsable value.
    #[error("invalid parameter \"{0}\"")]
    InvalidParameter(String),

    /// A key that fills an already-filled slot (shared send/expect_alive
    /// slots, duplicate upstream names).
    #[error("\"{0}\" is duplicate")]
    Duplicate(&'static str),

    /// A value that parsed as TOML but is out of range or malformed.
    #[error("invalid value \"{1}\" for \"{0}\"")]
    InvalidValue(&'static str, String),

    /// `type=` names a checker this build does not know.
    #[error("unknown check type \"{0}\"")]
    UnknownCheckType(String),

    /// A server entry is not a usable socket address.
    #[error("invalid server address \"{0}\": {1}")]
    InvalidServerAddress(String, String),

    /// Two peers resolved to the same (address, check type) identity.
    #[error("duplicate peer {0}")]
    DuplicatePeer(String),

    /// An upstream pool has no servers.
    #[error("upstream \"{0}\" has no servers")]
    EmptyUpstream(String),

    /// Two pools share the same name.
    #[error("duplicate upstream \"{0}\"")]
    DuplicateUpstream(String),

    /// A bind address in the config is not a socket address.
    #[error("\"{0}\" is not a bind address: {1}")]
    InvalidBindAddress(&'static str, String),

    /// The status route must be an absolute path.
    #[error("status path \"{0}\" must start with '/'")]
    InvalidStatusPath(String),

    /// More peers are configured than the state region can hold.
    #[error("check_shm_size holds {capacity} peers but {configured} are configured")]
    StateRegionTooSmall { capacity: usize, configured: usize },
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<UpcheckConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: UpcheckConfig = toml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config)
}
