//! # Issuance Oracle
//!
//! What the verification engine asks the issuance system: "issue this
//! payload, or tell me about the credential you already issued for it".
//!
//! Three outcomes are kept apart:
//!
//! - the service answered with a credential (`success: true`),
//! - the service answered without one, including any non-2xx status
//!   (`success: false`),
//! - the service could not be reached or its answer could not be read
//!   ([`OracleUnavailable`]).

use async_trait::async_trait;
use kcred_core::{Credential, CredentialData};

use crate::error::IssuanceClientError;
use crate::IssuanceClient;

/// The issuance system's answer about one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleReply {
    /// The call succeeded on the issuance side.
    pub success: bool,
    /// The credential issued for the payload, if any.
    pub credential: Option<Credential>,
}

impl OracleReply {
    /// A reply carrying a credential.
    pub fn issued(credential: Credential) -> Self {
        Self {
            success: true,
            credential: Some(credential),
        }
    }

    /// A reply with no credential.
    pub fn rejected() -> Self {
        Self {
            success: false,
            credential: None,
        }
    }

    /// The credential, when the reply counts as a match.
    pub fn into_credential(self) -> Option<Credential> {
        if self.success {
            self.credential
        } else {
            None
        }
    }
}

/// The issuance system could not be consulted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to connect to issuance service: {reason}")]
pub struct OracleUnavailable {
    /// What went wrong, for logs.
    pub reason: String,
}

impl OracleUnavailable {
    /// Create with a reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Network-facing interface the verification engine uses to consult issuance.
#[async_trait]
pub trait IssuanceOracle: Send + Sync {
    /// Issue `data`, or fetch the credential already issued for it.
    async fn issue_or_fetch(&self, data: &CredentialData) -> Result<OracleReply, OracleUnavailable>;
}

#[async_trait]
impl IssuanceOracle for IssuanceClient {
    async fn issue_or_fetch(&self, data: &CredentialData) -> Result<OracleReply, OracleUnavailable> {
        match self.issue(data).await {
            Ok(resp) => Ok(OracleReply {
                success: resp.success,
                credential: resp.credential,
            }),
            Err(IssuanceClientError::ApiError { status, body, .. }) => {
                tracing::warn!(status, body = %body, "issuance service returned error");
                Ok(OracleReply::rejected())
            }
            Err(e) => {
                tracing::error!(error = %e, "error checking with issuance service");
                Err(OracleUnavailable::new(e.to_string()))
            }
        }
    }
}
