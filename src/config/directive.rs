//! Parsing for the inline `check` attribute string and size values.
//!
//! The `check` key packs the per-pool probe parameters into one
//! space-separated string, e.g.
//! `"type=http interval=5000 timeout=1000 rise=2 fall=3"`.
//! Unknown attributes and unparsable values are rejected, naming the
//! offending token.

use crate::config::loader::ConfigError;

/// Parsed `check` attributes. The type name stays a raw string here;
/// it is resolved against the known checker set when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDirective {
    pub check_type: Option<String>,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub rise: u32,
    pub fall: u32,
}

impl Default for CheckDirective {
    fn default() -> Self {
        Self {
            check_type: None,
            interval_ms: 30_000,
            timeout_ms: 1_000,
            rise: 2,
            fall: 5,
        }
    }
}

/// Parse the space-separated `key=value` attributes of a `check` string.
///
/// Attributes may appear in any order and each is optional. Anything
/// else, including a bad value, is an invalid parameter.
pub fn parse_check(args: &str) -> Result<CheckDirective, ConfigError> {
    let mut directive = CheckDirective::default();

    for token in args.split_whitespace() {
        let invalid = || ConfigError::InvalidParameter(token.to_string());

        if let Some(value) = token.strip_prefix("type=") {
            if value.is_empty() {
                return Err(invalid());
            }
            directive.check_type = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("interval=") {
            directive.interval_ms = value.parse().map_err(|_| invalid())?;
        } else if let Some(value) = token.strip_prefix("timeout=") {
            directive.timeout_ms = value.parse().map_err(|_| invalid())?;
        } else if let Some(value) = token.strip_prefix("rise=") {
            directive.rise = value.parse().map_err(|_| invalid())?;
        } else if let Some(value) = token.strip_prefix("fall=") {
            directive.fall = value.parse().map_err(|_| invalid())?;
        } else {
            return Err(invalid());
        }
    }

    Ok(directive)
}

/// Parse a human-readable size such as "4096", "512k", "8m" or "1g".
///
/// Returns `None` for anything that does not fit in a `u64` byte count.
pub fn parse_size(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (digits, multiplier) = match trimmed.as_bytes()[trimmed.len() - 1] {
        b'k' | b'K' => (&trimmed[..trimmed.len() - 1], 1024u64),
        b'm' | b'M' => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        b'g' | b'G' => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
        _ => (trimmed, 1),
    };

    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier)
}
