//! Client configuration parsed from environment variables.

use crate::state::session::MutationOrdering;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3333";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_HOME_PATH: &str = "/";

/// Errors produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeouts: Timeouts,
    pub login_path: String,
    pub home_path: String,
    pub ordering: MutationOrdering,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            home_path: DEFAULT_HOME_PATH.to_owned(),
            ordering: MutationOrdering::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// All optional:
    /// - `CLINIC_API_URL`: backend base URL (trailing `/` trimmed)
    /// - `CLINIC_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CLINIC_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CLINIC_LOGIN_PATH`: default `/login`
    /// - `CLINIC_HOME_PATH`: default `/`
    /// - `CLINIC_MUTATION_ORDERING`: `last-settled` (default) or `last-issued`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for an unknown ordering or a path not starting with `/`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("CLINIC_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let timeouts = Timeouts {
            request_secs: env_parse_u64("CLINIC_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("CLINIC_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let login_path = parse_route_path(
            "CLINIC_LOGIN_PATH",
            std::env::var("CLINIC_LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_owned()),
        )?;
        let home_path = parse_route_path(
            "CLINIC_HOME_PATH",
            std::env::var("CLINIC_HOME_PATH").unwrap_or_else(|_| DEFAULT_HOME_PATH.to_owned()),
        )?;
        let ordering = parse_ordering(std::env::var("CLINIC_MUTATION_ORDERING").ok().as_deref())?;

        Ok(Self { api_url, timeouts, login_path, home_path, ordering })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn parse_route_path(key: &str, raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::Parse(format!("{key} must start with '/': {trimmed}")))
    }
}

/// Parse a `CLINIC_MUTATION_ORDERING` value; `None` or blank means the default.
///
/// # Errors
///
/// [`ConfigError::Parse`] for anything other than `last-settled` or `last-issued`.
pub fn parse_ordering(raw: Option<&str>) -> Result<MutationOrdering, ConfigError> {
    match raw.map(str::trim).unwrap_or("last-settled") {
        "last-settled" | "" => Ok(MutationOrdering::LastSettled),
        "last-issued" => Ok(MutationOrdering::LastIssued),
        other => Err(ConfigError::Parse(format!(
            "unsupported mutation ordering '{other}' (expected 'last-settled' or 'last-issued')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
