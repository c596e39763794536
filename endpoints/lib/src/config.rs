//! Session configuration from files and the environment.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::session::SessionBuilder;
use crate::transport::http::DEFAULT_TIMEOUT_SECS;
use crate::Session;

pub const ENV_BASE_URL: &str = "ENDPOINTS_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "ENDPOINTS_TIMEOUT_SECS";
pub const ENV_DEBUG: &str = "ENDPOINTS_DEBUG";
pub const ENV_CACHE_CAPACITY: &str = "ENDPOINTS_CACHE_CAPACITY";

/// Declarative session settings.
///
/// A `cache_capacity` of `0` disables caching; leaving it unset keeps the
/// default in-memory cache.
///
/// ## Examples
///
/// ```rust
/// use endpoints::SessionConfig;
///
/// let config = SessionConfig::from_yaml(
///     "base_url: https://httpbin.org\ntimeout_secs: 10\ndefault_headers:\n  X-Client: docs\n",
/// )?;
/// assert_eq!(config.timeout_secs, 10);
/// assert_eq!(config.default_headers["X-Client"], "docs");
/// # Ok::<(), endpoints::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_url: Option<Url>,
    pub timeout_secs: u64,
    pub default_headers: BTreeMap<String, String>,
    pub debug: bool,
    pub cache_capacity: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_headers: BTreeMap::new(),
            debug: false,
            cache_capacity: None,
        }
    }
}

impl SessionConfig {
    /// Reads `ENDPOINTS_BASE_URL`, `ENDPOINTS_TIMEOUT_SECS`, `ENDPOINTS_DEBUG`
    /// and `ENDPOINTS_CACHE_CAPACITY`. Unset variables keep their defaults.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BASE_URL) {
            let url = Url::parse(raw.trim()).map_err(|e| invalid_env(ENV_BASE_URL, e))?;
            config.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| invalid_env(ENV_TIMEOUT_SECS, e))?;
            if config.timeout_secs == 0 {
                return Err(invalid_env(ENV_TIMEOUT_SECS, ZERO_TIMEOUT));
            }
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(&raw).ok_or_else(|| {
                invalid_env(ENV_DEBUG, format!("expected a boolean, got {raw:?}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            config.cache_capacity = Some(
                raw.trim()
                    .parse()
                    .map_err(|e| invalid_env(ENV_CACHE_CAPACITY, e))?,
            );
        }

        Ok(config)
    }

    /// Parses a YAML document.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] naming the document if it cannot
    /// be parsed.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(source).map_err(|e| invalid_env("config document", e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Turns the settings into a session builder.
    ///
    /// ## Errors
    ///
    /// Returns an error if `base_url` is missing, `timeout_secs` is zero or
    /// a header is invalid.
    pub fn to_builder(&self) -> Result<SessionBuilder, ConfigError> {
        let base_url = self
            .base_url
            .clone()
            .ok_or_else(|| ConfigError::missing_field("base_url"))?;
        if self.timeout_secs == 0 {
            return Err(invalid_env("timeout_secs", ZERO_TIMEOUT));
        }

        let mut builder = Session::builder(base_url)
            .timeout(self.timeout())
            .debug(self.debug);
        for (name, value) in &self.default_headers {
            builder = builder.default_header(name, value)?;
        }
        builder = match self.cache_capacity {
            Some(0) => builder.without_cache(),
            Some(capacity) => builder.cache_capacity(capacity),
            None => builder,
        };
        Ok(builder)
    }
}

const ZERO_TIMEOUT: &str = "timeout must be at least one second";

fn invalid_env(var: &'static str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidEnv {
        var,
        message: message.to_string(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
