//! # Credential Verification Endpoints
//!
//! - `GET  /`: service descriptor.
//! - `GET  /api/verification/health`: liveness with worker identity.
//! - `POST /api/verification/verify`: verdict for a payload.
//! - `GET  /api/verification/worker`: which replica answered.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use kcred_core::{HealthStatus, Timestamp, WorkerInfo};

use crate::engine::VerificationResult;
use crate::error::AppError;
use crate::extractors::extract_credential_data;
use crate::state::{AppState, SERVICE_NAME};

/// Response body of `POST /api/verification/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// True whenever a verdict was reached, valid or invalid.
    pub success: bool,
    #[serde(flatten)]
    pub result: VerificationResult,
}

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(descriptor))
        .route("/api/verification/health", get(health))
        .route("/api/verification/verify", post(verify_credential))
        .route("/api/verification/worker", get(worker))
}

/// GET /: service name, version, and endpoint map.
async fn descriptor() -> Json<Value> {
    Json(json!({
        "service": "Kube Credential - Verification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/verification/health",
            "verify": "POST /api/verification/verify",
            "worker": "/api/verification/worker",
        },
    }))
}

/// GET /api/verification/health
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(
        SERVICE_NAME,
        state.engine.worker_id().clone(),
    ))
}

/// GET /api/verification/worker
async fn worker(State(state): State<AppState>) -> Json<WorkerInfo> {
    Json(WorkerInfo {
        worker_id: state.engine.worker_id().clone(),
        timestamp: Timestamp::now(),
    })
}

/// POST /api/verification/verify: always `200` once a verdict is reached;
/// `503` if the issuance service cannot be consulted.
async fn verify_credential(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let data = extract_credential_data(body)?;
    let result = state.engine.verify(&data).await?;
    Ok(Json(VerifyResponse {
        success: true,
        result,
    }))
}
