#![deny(missing_docs)]

//! # kcred-core — Foundational Types for Kube Credential
//!
//! Both services (issuance and verification) agree on what "the same
//! credential" means through this crate. It has no internal crate
//! dependencies and performs no network I/O.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to a [`CredentialId`].** A
//!    credential identity is `hex(sha256(canonical(data)))`; the digest
//!    functions accept only canonical bytes.
//!
//! 2. **Newtypes for identifiers.** A [`CredentialId`] cannot be passed where
//!    a [`WorkerId`] is expected, even though both are strings on the wire.
//!
//! 3. **Stores are explicit components.** [`RecordStore`] is an object-safe
//!    trait with an atomic [`RecordStore::insert_if_absent`]; engines hold a
//!    store handle instead of reaching for process-wide state.
//!
//! 4. **Structured errors.** `thiserror` enums only, no `.unwrap()` outside
//!    tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod record;
pub mod store;
pub mod temporal;
pub mod wire;
pub mod worker;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, CredentialId};
pub use error::{StoreError, ValidationError};
pub use record::{Credential, CredentialData, Record, VerificationRecord, VerificationStatus};
pub use store::{Insertion, JsonStore, RecordStore};
pub use temporal::Timestamp;
pub use wire::{CredentialRequest, HealthStatus, IssuanceResponse, WorkerInfo};
pub use worker::WorkerId;
