//! Semantic validation of loaded configuration.
//!
//! Serde handles the syntax; this pass checks what the schema cannot
//! express: unique pool names, non-empty server lists, usable bind
//! addresses and single use of the shared send/expect_alive slots.
//! Check attribute strings are resolved later, when the registry is
//! built, so this stays a pure string-level pass.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::loader::ConfigError;
use crate::config::schema::UpcheckConfig;

/// Validate a parsed configuration, failing on the first problem found.
pub fn validate_config(config: &UpcheckConfig) -> Result<(), ConfigError> {
    config.state_size_bytes()?;

    if config.status.enabled {
        parse_bind("status.bind_address", &config.status.bind_address)?;
        if !config.status.path.starts_with('/') {
            return Err(ConfigError::InvalidStatusPath(config.status.path.clone()));
        }
    }

    if config.observability.metrics_enabled {
        parse_bind(
            "observability.metrics_address",
            &config.observability.metrics_address,
        )?;
    }

    let mut names = HashSet::new();
    for upstream in &config.upstreams {
        if upstream.name.is_empty() {
            return Err(ConfigError::InvalidValue("name", String::new()));
        }
        if !names.insert(upstream.name.as_str()) {
            return Err(ConfigError::DuplicateUpstream(upstream.name.clone()));
        }
        if upstream.servers.is_empty() {
            return Err(ConfigError::EmptyUpstream(upstream.name.clone()));
        }
        upstream.probe_send()?;
        upstream.expect_alive()?;
    }

    Ok(())
}

fn parse_bind(key: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidBindAddress(key, value.to_string()))
}
