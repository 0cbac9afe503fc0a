/// Process-wide configuration for the GNews gateway
///
/// Built once at startup from command line flags (with environment variable
/// fallbacks) and injected into the dispatcher. Nothing below this module
/// reads the environment.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::domain::Operation;

/// Public GNews v4 API root
pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Timeout must be between 1 and 300 seconds, got {0}")]
    InvalidTimeout(u64),
}

/// Credentials and endpoint settings for the GNews API
#[derive(Clone)]
pub struct GNewsConfig {
    api_key: Option<String>,
    base_url: Url,
    timeout: Duration,
}

impl GNewsConfig {
    /// Build a configuration, treating a blank API key as absent
    pub fn new(api_key: Option<String>, base_url: &str, timeout_secs: u64) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if !(1..=300).contains(&timeout_secs) {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            api_key,
            base_url: parsed,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration against the public API
    pub fn with_api_key(api_key: Option<String>) -> Result<Self, ConfigError> {
        Self::new(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL of the endpoint serving an operation
    pub fn endpoint_url(&self, operation: Operation) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            operation.endpoint()
        )
    }
}

// The key is redacted so the config can be logged
impl fmt::Debug for GNewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
