//! # Issuance Engine
//!
//! Turns a credential payload into a stored [`Credential`], at most once per
//! identity. A repeat request for the same payload returns the stored record
//! unchanged, including its original `issuedBy` and `issuedAt`.

use std::sync::Arc;

use kcred_core::{
    Credential, CredentialData, CredentialId, Insertion, RecordStore, StoreError, Timestamp,
    WorkerId,
};
use thiserror::Error;

/// Failure of [`IssuanceEngine::issue`].
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The credential store could not be read or written.
    #[error("credential storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    /// The blocking issuance task panicked or was cancelled.
    #[error("issuance task did not complete: {0}")]
    Interrupted(String),
}

/// Result of a successful issuance call.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceOutcome {
    /// The stored credential.
    pub credential: Credential,
    /// True if the credential existed before this call.
    pub already_issued: bool,
}

impl IssuanceOutcome {
    /// Human-readable summary naming the issuing worker.
    pub fn message(&self) -> String {
        if self.already_issued {
            format!("Credential already issued by {}", self.credential.issued_by)
        } else {
            format!("Credential issued by {}", self.credential.issued_by)
        }
    }
}

/// Idempotent credential issuer for one replica.
pub struct IssuanceEngine {
    store: Arc<dyn RecordStore<Credential>>,
    worker: WorkerId,
}

impl std::fmt::Debug for IssuanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceEngine")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl IssuanceEngine {
    /// Create an engine writing to `store` on behalf of `worker`.
    pub fn new(store: Arc<dyn RecordStore<Credential>>, worker: WorkerId) -> Self {
        Self { store, worker }
    }

    /// The worker this engine stamps into `issuedBy`.
    pub fn worker_id(&self) -> &WorkerId {
        &self.worker
    }

    /// Issue a credential for `data`, or return the one already issued.
    ///
    /// The lookup and the write are one atomic store operation, so concurrent
    /// calls with the same payload create exactly one credential.
    pub fn issue(&self, data: CredentialData) -> Result<IssuanceOutcome, IssuanceError> {
        let id = CredentialId::derive(&data);

        // Fast path: no candidate record or clock read for repeat requests.
        if let Some(existing) = self.store.get(id.as_str())? {
            tracing::info!(credential_id = %id, issued_by = %existing.issued_by, "credential already issued");
            return Ok(IssuanceOutcome {
                credential: existing,
                already_issued: true,
            });
        }

        let candidate = Credential {
            id,
            data,
            issued_by: self.worker.clone(),
            issued_at: Timestamp::now(),
        };

        let outcome = match self.store.insert_if_absent(candidate)? {
            Insertion::Inserted(credential) => IssuanceOutcome {
                credential,
                already_issued: false,
            },
            Insertion::Existing(credential) => IssuanceOutcome {
                credential,
                already_issued: true,
            },
        };

        tracing::info!(
            credential_id = %outcome.credential.id,
            worker_id = %self.worker,
            already_issued = outcome.already_issued,
            "credential issuance completed"
        );
        Ok(outcome)
    }

    /// [`issue`](Self::issue) on the blocking thread pool.
    ///
    /// Store writes are synchronous file I/O under the store's write lock;
    /// async handlers call this so runtime workers keep serving other requests.
    pub async fn issue_async(
        self: &Arc<Self>,
        data: CredentialData,
    ) -> Result<IssuanceOutcome, IssuanceError> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.issue(data))
            .await
            .map_err(|e| IssuanceError::Interrupted(e.to_string()))?
    }
}
