//! Configuration management for the client.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the device-local storage file.
pub const DEFAULT_STORAGE_PATH: &str = ".basket/storage.json";

/// Default lifetime of cached categories.
pub const DEFAULT_CATEGORY_TTL_SECS: u64 = 300;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the storefront backend
    pub api_url: String,
    /// File holding device-local storage
    pub storage_path: PathBuf,
    /// How long category lookups are cached
    pub category_ttl: Duration,
    /// Overall HTTP timeout; unset leaves the HTTP client's default
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Configuration with defaults for everything but the backend URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            category_ttl: Duration::from_secs(DEFAULT_CATEGORY_TTL_SECS),
            http_timeout: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("BASKET_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;

        let mut config = Self::new(api_url.trim_end_matches('/'));

        if let Some(path) = lookup("BASKET_STORAGE_PATH").filter(|p| !p.is_empty()) {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("BASKET_CATEGORY_TTL_SECS") {
            let secs = raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("BASKET_CATEGORY_TTL_SECS", raw))?;
            config.category_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("BASKET_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("BASKET_HTTP_TIMEOUT_SECS", raw))?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BASKET_API_URL environment variable is required")]
    MissingApiUrl,

    #[error("Invalid {0} value: {1}")]
    InvalidNumber(&'static str, String),
}
