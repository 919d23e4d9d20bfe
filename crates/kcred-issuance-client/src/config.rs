//! Issuance client configuration.
//!
//! Points at the issuance service. In Kubernetes this is the service DNS
//! name; locally it defaults to `http://localhost:3001`.

use url::Url;

/// Default issuance service location.
pub const DEFAULT_ISSUANCE_URL: &str = "http://localhost:3001";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for connecting to the issuance service.
#[derive(Debug, Clone)]
pub struct IssuanceClientConfig {
    /// Base URL of the issuance service.
    pub base_url: Url,
    /// Request timeout in seconds. Applies to connect and response together.
    pub timeout_secs: u64,
}

impl IssuanceClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ISSUANCE_SERVICE_URL` (default: `http://localhost:3001`)
    /// - `ISSUANCE_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = env("ISSUANCE_SERVICE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ISSUANCE_URL.to_string());
        let base_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::InvalidUrl("ISSUANCE_SERVICE_URL".to_string(), e.to_string()))?;

        let timeout_secs = match env("ISSUANCE_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => return Err(ConfigError::InvalidTimeout(raw)),
                Ok(secs) => secs,
                Err(_) => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout_secs,
        })
    }

    /// Configuration for a service at `base_url` with the default timeout.
    pub fn for_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("ISSUANCE_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}
