//! # Wire Types
//!
//! Request and response bodies shared between the issuance service and its
//! HTTP client. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::record::{Credential, CredentialData};
use crate::temporal::Timestamp;
use crate::worker::WorkerId;

/// Body of `POST /api/credentials/issue` and `POST /api/verification/verify`.
///
/// Inbound bodies are read with [`from_body`](Self::from_body) rather than a
/// derived `Deserialize`, which would also accept a positional JSON array.
/// `credential_data` is held as a raw [`Value`] so that a missing, null, or
/// non-object payload reaches [`into_data`](Self::into_data) and is reported
/// with the service's own validation message instead of a serde rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// The credential payload.
    #[serde(default)]
    pub credential_data: Option<Value>,
}

impl CredentialRequest {
    /// Wrap a payload for sending.
    pub fn new(data: CredentialData) -> Self {
        Self {
            credential_data: Some(Value::Object(data)),
        }
    }

    /// Read a request from a parsed JSON body. The body must be an object;
    /// unknown fields are ignored.
    pub fn from_body(body: Value) -> Result<Self, ValidationError> {
        match body {
            Value::Object(mut fields) => Ok(Self {
                credential_data: fields.remove("credentialData"),
            }),
            _ => Err(ValidationError::InvalidCredentialData),
        }
    }

    /// Validate a whole request body and return its payload.
    ///
    /// Both services accept request bodies through this one check.
    pub fn payload_of(body: Value) -> Result<CredentialData, ValidationError> {
        Self::from_body(body)?.into_data()
    }

    /// Validate and extract the payload. Only JSON objects are accepted.
    pub fn into_data(self) -> Result<CredentialData, ValidationError> {
        match self.credential_data {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(ValidationError::InvalidCredentialData),
        }
    }
}

/// Body returned by `POST /api/credentials/issue` on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResponse {
    /// Always true on a 2xx response.
    pub success: bool,
    /// Human-readable summary naming the issuing worker.
    #[serde(default)]
    pub message: String,
    /// The issued or previously issued credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    /// True when the credential existed before this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_issued: Option<bool>,
}

/// Body of the `/worker` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerInfo {
    /// The replica answering.
    pub worker_id: WorkerId,
    /// Time of the answer.
    pub timestamp: Timestamp,
}

/// Body of the `/health` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// `healthy` while the process is serving.
    pub status: String,
    /// `issuance-service` or `verification-service`.
    pub service: String,
    /// The replica answering.
    pub worker_id: WorkerId,
    /// Time of the answer.
    pub timestamp: Timestamp,
}

impl HealthStatus {
    /// A healthy status for `service` on `worker_id`, stamped now.
    pub fn healthy(service: &str, worker_id: WorkerId) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
            worker_id,
            timestamp: Timestamp::now(),
        }
    }
}
