//! # Error Types
//!
//! Errors shared by both services. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Failure of a [`RecordStore`](crate::store::RecordStore) operation.
///
/// A store error never leaves a partially written record observable: the
/// in-memory view is only updated after the backing file has been replaced.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing medium could not be read or written.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// The file or directory that failed.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Records could not be serialized for persistence.
    #[error("failed to serialize {collection}: {source}")]
    Serialization {
        /// The collection being written.
        collection: &'static str,
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// An existing store file exists but does not parse.
    #[error("store file {path} is corrupt: {reason}")]
    Corrupt {
        /// The file that failed to parse.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Request payload validation failure.
///
/// Raised at the HTTP boundary before either engine runs; the engines assume
/// a well-formed mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `credentialData` is missing, null, or not a JSON object.
    #[error("Invalid request: credentialData is required and must be an object")]
    InvalidCredentialData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_names_path() {
        let err = StoreError::Io {
            path: "/data/credentials.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/credentials.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn corrupt_error_display() {
        let err = StoreError::Corrupt {
            path: "v.json".to_string(),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("corrupt"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn validation_error_message_matches_http_contract() {
        let msg = ValidationError::InvalidCredentialData.to_string();
        assert!(msg.contains("credentialData is required"));
        assert!(msg.contains("must be an object"));
    }
}
