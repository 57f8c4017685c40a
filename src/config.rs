use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DEALERSHIP_API_URL is not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("DEALERSHIP_API_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    pub timeout: Duration,
    /// Where the auth token is persisted; kept in memory when unset.
    pub token_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_path: None,
        }
    }
}

impl Config {
    /// Reads the process environment as it is. Loading a `.env` file is left
    /// to the binary's startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("DEALERSHIP_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        reqwest::Url::parse(api_url.trim())
            .map_err(|e| ConfigError::InvalidUrl(format!("{api_url} ({e})")))?;

        let timeout = match lookup("DEALERSHIP_API_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let token_path = lookup("DEALERSHIP_TOKEN_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            timeout,
            token_path,
        })
    }
}
