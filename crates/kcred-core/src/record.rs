//! # Data Model
//!
//! The two persisted record kinds: [`Credential`], owned by the issuance
//! service, and [`VerificationRecord`], owned by the verification service.
//! Field names serialize in camelCase, which is both the HTTP and the file
//! layout.

use serde::{Deserialize, Serialize};

use crate::digest::CredentialId;
use crate::temporal::Timestamp;
use crate::worker::WorkerId;

/// An arbitrary JSON object describing the credential subject.
pub type CredentialData = serde_json::Map<String, serde_json::Value>;

/// A record that can be kept in a [`RecordStore`](crate::store::RecordStore).
pub trait Record: Clone + Send + Sync + 'static {
    /// The key the store indexes this record under.
    fn record_id(&self) -> &str;
}

/// An issued credential.
///
/// Created exactly once per identity; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Identity of `data`.
    pub id: CredentialId,
    /// The payload as received on first issuance.
    pub data: CredentialData,
    /// Worker that first issued it.
    pub issued_by: WorkerId,
    /// Time of first issuance.
    pub issued_at: Timestamp,
}

impl Credential {
    /// Build a new credential for `data`, deriving its id.
    pub fn issue(data: CredentialData, issued_by: WorkerId, issued_at: Timestamp) -> Self {
        Self {
            id: CredentialId::derive(&data),
            data,
            issued_by,
            issued_at,
        }
    }
}

impl Record for Credential {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// The issuance service returned a credential.
    Valid,
    /// The issuance service answered without a credential.
    Invalid,
}

impl VerificationStatus {
    /// The wire form: `valid` or `invalid`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the verification audit log.
///
/// Appended on every completed verification, valid or invalid. Repeated
/// checks of the same payload produce repeated entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Identity computed from the checked payload.
    pub credential_id: CredentialId,
    /// Worker that performed the check.
    pub verified_by: WorkerId,
    /// Time of the check.
    pub verified_at: Timestamp,
    /// The verdict.
    pub status: VerificationStatus,
    /// Issuer of the matched credential, when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<WorkerId>,
    /// Issue time of the matched credential, when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,
}

impl Record for VerificationRecord {
    fn record_id(&self) -> &str {
        self.credential_id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_data() -> CredentialData {
        json!({"name": "Alice", "degree": "BSc"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn credential_serializes_camel_case() {
        let ts = Timestamp::parse("2024-01-01T00:00:00.000Z").unwrap();
        let cred = Credential::issue(sample_data(), WorkerId::new("w-1"), ts);
        let value = serde_json::to_value(&cred).unwrap();
        assert_eq!(value["issuedBy"], "w-1");
        assert_eq!(value["issuedAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["id"], cred.id.as_str());
        assert_eq!(value["data"]["name"], "Alice");
    }

    #[test]
    fn credential_id_matches_data() {
        let cred = Credential::issue(sample_data(), WorkerId::new("w"), Timestamp::now());
        assert_eq!(cred.id, CredentialId::derive(&sample_data()));
        assert_eq!(cred.record_id(), cred.id.as_str());
    }

    #[test]
    fn invalid_record_omits_issuer_fields() {
        let record = VerificationRecord {
            credential_id: CredentialId::derive(&sample_data()),
            verified_by: WorkerId::new("v-1"),
            verified_at: Timestamp::now(),
            status: VerificationStatus::Invalid,
            issued_by: None,
            issued_at: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "invalid");
        assert!(value.get("issuedBy").is_none());
        assert!(value.get("issuedAt").is_none());
        assert_eq!(record.record_id(), record.credential_id.as_str());
    }

    #[test]
    fn verification_record_reads_without_optional_fields() {
        let id = CredentialId::derive(&sample_data());
        let raw = json!({
            "credentialId": id.as_str(),
            "verifiedBy": "v-2",
            "verifiedAt": "2024-05-01T12:00:00.000Z",
            "status": "valid",
        });
        let record: VerificationRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.status, VerificationStatus::Valid);
        assert!(record.issued_by.is_none());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(VerificationStatus::Valid.to_string(), "valid");
        assert_eq!(
            serde_json::to_string(&VerificationStatus::Invalid).unwrap(),
            "\"invalid\""
        );
    }
}
