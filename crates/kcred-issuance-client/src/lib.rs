//! # kcred-issuance-client -- Typed Rust client for the issuance service
//!
//! Provides typed access to the issuance service's HTTP API and the
//! [`IssuanceOracle`] abstraction the verification engine is written against.
//!
//! ## Architecture
//!
//! The verification service never touches the credential store. Everything
//! it learns about a credential comes through this crate, over HTTP.
//!
//! ## Endpoints
//!
//! - `POST {base_url}/api/credentials/issue`
//! - `GET  {base_url}/api/credentials/health`

pub mod config;
pub mod error;
pub mod oracle;

pub use config::IssuanceClientConfig;
pub use error::IssuanceClientError;
pub use oracle::{IssuanceOracle, OracleReply, OracleUnavailable};

use std::time::Duration;

use kcred_core::{CredentialData, CredentialRequest, HealthStatus, IssuanceResponse};
use serde::de::DeserializeOwned;

/// Client for the issuance service API.
#[derive(Debug, Clone)]
pub struct IssuanceClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl IssuanceClient {
    /// Create a new issuance client from configuration.
    pub fn new(config: IssuanceClientConfig) -> Result<Self, IssuanceClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IssuanceClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// The service this client talks to.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Issue a credential, or fetch the one already issued for `data`.
    ///
    /// Calls `POST {base_url}/api/credentials/issue`. Both `201` (new) and
    /// `200` (existing) are success.
    pub async fn issue(
        &self,
        data: &CredentialData,
    ) -> Result<IssuanceResponse, IssuanceClientError> {
        let endpoint = "POST /api/credentials/issue";
        let url = self.url("/api/credentials/issue");
        let body = CredentialRequest::new(data.clone());

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IssuanceClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        Self::decode(endpoint, resp).await
    }

    /// Check the issuance service's health.
    ///
    /// Calls `GET {base_url}/api/credentials/health`.
    pub async fn health(&self) -> Result<HealthStatus, IssuanceClientError> {
        let endpoint = "GET /api/credentials/health";
        let url = self.url("/api/credentials/health");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| IssuanceClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        Self::decode(endpoint, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, IssuanceClientError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IssuanceClientError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| IssuanceClientError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> IssuanceClient {
        IssuanceClient::new(IssuanceClientConfig::for_url(base).unwrap()).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(
            client("http://issuance:3001").url("/api/credentials/issue"),
            "http://issuance:3001/api/credentials/issue"
        );
        assert_eq!(
            client("http://issuance:3001/").url("/api/credentials/issue"),
            "http://issuance:3001/api/credentials/issue"
        );
    }

    #[test]
    fn url_keeps_path_prefix() {
        assert_eq!(
            client("http://gateway/issuance/").url("/api/credentials/health"),
            "http://gateway/issuance/api/credentials/health"
        );
    }
}
