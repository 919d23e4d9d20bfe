//! # Request Extraction
//!
//! Maps Axum JSON rejections onto [`AppError::BadRequest`] so malformed
//! bodies get the same error envelope as every other failure.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use kcred_core::{CredentialData, CredentialRequest};
use serde_json::Value;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract the `credentialData` object from a `{"credentialData": {...}}` body.
pub fn extract_credential_data(
    result: Result<Json<Value>, JsonRejection>,
) -> Result<CredentialData, AppError> {
    Ok(CredentialRequest::payload_of(extract_json(result)?)?)
}
