//! Configuration management for the booking client.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use stayflow_runtime::RuntimeConfig;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base URL is not an http(s) URL
    #[error("STAYFLOW_API_URL must start with http:// or https://, got '{0}'")]
    InvalidApiUrl(String),

    /// A limit that must be positive is zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the booking API
    pub api_url: String,
    /// Per-request timeout in seconds, applied by the request services
    pub request_timeout: u64,
    /// Rerun limit for one write cycle
    pub max_reruns_per_cycle: usize,
    /// Whether reaction panics are isolated
    pub catch_panics: bool,
    /// Currency label shown next to prices
    pub currency: String,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Falls back to defaults for missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("STAYFLOW_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            request_timeout: env::var("STAYFLOW_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            max_reruns_per_cycle: env::var("STAYFLOW_MAX_RERUNS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(32),
            catch_panics: env::var("STAYFLOW_CATCH_PANICS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            currency: env::var("STAYFLOW_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            log_filter: env::var("STAYFLOW_LOG")
                .unwrap_or_else(|_| "stayflow_booking=info,stayflow_runtime=info".to_string()),
        }
    }

    /// Check values that have no safe fallback
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-http API URL or a zero limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Zero("STAYFLOW_REQUEST_TIMEOUT"));
        }
        if self.max_reruns_per_cycle == 0 {
            return Err(ConfigError::Zero("STAYFLOW_MAX_RERUNS"));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Scheduler configuration
    #[must_use]
    pub const fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig::new(self.max_reruns_per_cycle, self.catch_panics)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            request_timeout: 30,
            max_reruns_per_cycle: 32,
            catch_panics: true,
            currency: "USD".to_string(),
            log_filter: "stayflow_booking=info,stayflow_runtime=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.timeout(), crate::service::DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.runtime(), RuntimeConfig::default());
    }

    #[test]
    fn rejects_non_http_url() {
        let config = Config {
            api_url: "ftp://example".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiUrl(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = Config {
            request_timeout: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("STAYFLOW_REQUEST_TIMEOUT")));
    }
}
