//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the checker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::directive;
use crate::config::loader::ConfigError;

/// Default size of the health state region when `check_shm_size` is absent.
pub const DEFAULT_STATE_SIZE: u64 = 1024 * 1024;

/// Root configuration for the health checker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpcheckConfig {
    /// Size of the health state region (e.g. "1m", "512k").
    ///
    /// May appear at most once; a repeated key fails the TOML parse.
    pub check_shm_size: Option<String>,

    /// Status report endpoint settings.
    pub status: StatusConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Upstream pool definitions.
    pub upstreams: Vec<UpstreamConfig>,
}

impl UpcheckConfig {
    /// Resolved state-region size in bytes.
    pub fn state_size_bytes(&self) -> Result<u64, ConfigError> {
        match &self.check_shm_size {
            Some(raw) => directive::parse_size(raw)
                .ok_or_else(|| ConfigError::InvalidValue("check_shm_size", raw.clone())),
            None => Ok(DEFAULT_STATE_SIZE),
        }
    }
}

/// Status report endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Serve the status report over HTTP.
    pub enabled: bool,

    /// Bind address for the status listener.
    pub bind_address: String,

    /// Route the report is served at.
    pub path: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:9145".to_string(),
            path: "/status".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One upstream pool of peers sharing a check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Pool name, used in logs and the status report.
    pub name: String,

    /// Peer addresses ("host:port").
    pub servers: Vec<String>,

    /// Inline check parameters:
    /// `"type=<http|smtp|tcp> interval=<ms> timeout=<ms> rise=<n> fall=<n>"`.
    ///
    /// Every attribute is optional; omitting the key entirely enables
    /// checking with the defaults.
    #[serde(default)]
    pub check: Option<String>,

    /// Literal bytes sent as the HTTP probe payload.
    #[serde(default)]
    pub check_http_send: Option<String>,

    /// Literal bytes sent as the SMTP probe payload.
    #[serde(default)]
    pub check_smtp_send: Option<String>,

    /// Response classes treated as alive ("http_2xx".."http_5xx").
    #[serde(default)]
    pub check_http_expect_alive: Option<Vec<String>>,

    /// Reply classes treated as alive ("smtp_2xx".."smtp_5xx").
    #[serde(default)]
    pub check_smtp_expect_alive: Option<Vec<String>>,
}

impl UpstreamConfig {
    /// Parse the inline `check` attributes, falling back to the defaults
    /// when the key is absent.
    pub fn check_directive(&self) -> Result<directive::CheckDirective, ConfigError> {
        match &self.check {
            Some(args) => directive::parse_check(args),
            None => Ok(directive::CheckDirective::default()),
        }
    }

    /// The configured probe payload, if any.
    ///
    /// `check_http_send` and `check_smtp_send` fill the same slot; setting
    /// both in one pool is a duplicate.
    pub fn probe_send(&self) -> Result<Option<&str>, ConfigError> {
        match (&self.check_http_send, &self.check_smtp_send) {
            (Some(_), Some(_)) => Err(ConfigError::Duplicate("check_smtp_send")),
            (http, smtp) => Ok(http.as_deref().or(smtp.as_deref())),
        }
    }

    /// The configured expect-alive class names, if any, together with the
    /// key they came from (for error reporting).
    ///
    /// The HTTP and SMTP variants fill the same slot, as with the payloads.
    pub fn expect_alive(&self) -> Result<Option<(&'static str, &[String])>, ConfigError> {
        match (&self.check_http_expect_alive, &self.check_smtp_expect_alive) {
            (Some(_), Some(_)) => Err(ConfigError::Duplicate("check_smtp_expect_alive")),
            (Some(names), None) => Ok(Some(("check_http_expect_alive", names.as_slice()))),
            (None, Some(names)) => Ok(Some(("check_smtp_expect_alive", names.as_slice()))),
            (None, None) => Ok(None),
        }
    }
}
