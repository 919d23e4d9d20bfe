//! Issuance client error types.

/// Errors from issuance service calls.
#[derive(Debug, thiserror::Error)]
pub enum IssuanceClientError {
    /// HTTP transport error (connection refused, DNS, timeout).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The issuance service returned a non-2xx status.
    #[error("issuance service {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl IssuanceClientError {
    /// True when the service answered, whatever it said.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }
}
