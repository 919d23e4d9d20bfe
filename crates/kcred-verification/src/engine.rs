//! # Verification Engine
//!
//! Decides whether a payload corresponds to an issued credential by asking
//! the issuance oracle to issue it. The oracle's idempotence means a payload
//! that was issued before comes back with its original issuer and time.
//!
//! A payload that was never issued is issued by this call and reported
//! `valid`. Verifying fresh data is therefore observably the same as issuing
//! it.
//!
//! Every completed check, valid or invalid, is appended to the verification
//! log. A check that could not reach the oracle is not logged.

use std::sync::Arc;
use std::time::Duration;

use kcred_core::{
    CredentialData, CredentialId, RecordStore, StoreError, Timestamp, VerificationRecord,
    VerificationStatus, WorkerId,
};
use kcred_issuance_client::IssuanceOracle;
use serde::Serialize;
use thiserror::Error;

/// Failure of [`VerificationEngine::verify`].
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The issuance oracle was unreachable, timed out, or answered unreadably.
    #[error("issuance oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The verification log could not be written.
    #[error("verification storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    /// The blocking log write panicked or was cancelled.
    #[error("verification task did not complete: {0}")]
    Interrupted(String),
}

/// The verdict returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// `valid` or `invalid`.
    pub status: VerificationStatus,
    /// Human-readable verdict.
    pub message: String,
    /// Worker that performed the check.
    pub verified_by: WorkerId,
    /// Time of the check.
    pub verified_at: Timestamp,
    /// Identity of the checked payload.
    pub credential_id: CredentialId,
    /// Original issuer, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<WorkerId>,
    /// Original issue time, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,
}

impl VerificationResult {
    /// The log entry for this verdict.
    pub fn to_record(&self) -> VerificationRecord {
        VerificationRecord {
            credential_id: self.credential_id.clone(),
            verified_by: self.verified_by.clone(),
            verified_at: self.verified_at,
            status: self.status,
            issued_by: self.issued_by.clone(),
            issued_at: self.issued_at,
        }
    }
}

/// Verifier for one replica.
pub struct VerificationEngine {
    oracle: Arc<dyn IssuanceOracle>,
    log: Arc<dyn RecordStore<VerificationRecord>>,
    worker: WorkerId,
    oracle_timeout: Duration,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("worker", &self.worker)
            .field("oracle_timeout", &self.oracle_timeout)
            .finish_non_exhaustive()
    }
}

impl VerificationEngine {
    /// Create an engine that consults `oracle`, bounded by `oracle_timeout`,
    /// and appends verdicts to `log`.
    pub fn new(
        oracle: Arc<dyn IssuanceOracle>,
        log: Arc<dyn RecordStore<VerificationRecord>>,
        worker: WorkerId,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            log,
            worker,
            oracle_timeout,
        }
    }

    /// The worker this engine stamps into `verifiedBy`.
    pub fn worker_id(&self) -> &WorkerId {
        &self.worker
    }

    /// Check `data` against the issuance system and log the verdict.
    pub async fn verify(
        &self,
        data: &CredentialData,
    ) -> Result<VerificationResult, VerificationError> {
        let verified_at = Timestamp::now();
        let credential_id = CredentialId::derive(data);

        let reply = match tokio::time::timeout(self.oracle_timeout, self.oracle.issue_or_fetch(data))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(unavailable)) => {
                tracing::warn!(credential_id = %credential_id, reason = %unavailable.reason, "issuance oracle unavailable");
                return Err(VerificationError::OracleUnavailable(unavailable.reason));
            }
            Err(_) => {
                tracing::warn!(
                    credential_id = %credential_id,
                    timeout_ms = self.oracle_timeout.as_millis() as u64,
                    "issuance oracle timed out"
                );
                return Err(VerificationError::OracleUnavailable(format!(
                    "no answer within {:?}",
                    self.oracle_timeout
                )));
            }
        };

        let result = match reply.into_credential() {
            Some(credential) => VerificationResult {
                status: VerificationStatus::Valid,
                message: format!(
                    "Credential is valid. Originally issued by {}",
                    credential.issued_by
                ),
                verified_by: self.worker.clone(),
                verified_at,
                credential_id,
                issued_by: Some(credential.issued_by),
                issued_at: Some(credential.issued_at),
            },
            None => VerificationResult {
                status: VerificationStatus::Invalid,
                message: "Credential not found or invalid".to_string(),
                verified_by: self.worker.clone(),
                verified_at,
                credential_id,
                issued_by: None,
                issued_at: None,
            },
        };

        // File store writes block; keep them off the runtime workers.
        let log = Arc::clone(&self.log);
        let record = result.to_record();
        tokio::task::spawn_blocking(move || log.put(record))
            .await
            .map_err(|e| VerificationError::Interrupted(e.to_string()))??;

        tracing::info!(
            credential_id = %result.credential_id,
            worker_id = %self.worker,
            status = %result.status,
            "verification completed"
        );
        Ok(result)
    }
}
