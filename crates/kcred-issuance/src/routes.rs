//! # Credential Issuance Endpoints
//!
//! - `GET  /`: service descriptor.
//! - `GET  /api/credentials/health`: liveness with worker identity.
//! - `POST /api/credentials/issue`: issue or return an existing credential.
//! - `GET  /api/credentials/worker`: which replica answered.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use kcred_core::{HealthStatus, IssuanceResponse, Timestamp, WorkerInfo};

use crate::error::AppError;
use crate::extractors::extract_credential_data;
use crate::state::{AppState, SERVICE_NAME};

/// Build the issuance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(descriptor))
        .route("/api/credentials/health", get(health))
        .route("/api/credentials/issue", post(issue_credential))
        .route("/api/credentials/worker", get(worker))
}

/// GET /: service name, version, and endpoint map.
async fn descriptor() -> Json<Value> {
    Json(json!({
        "service": "Kube Credential - Issuance Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/credentials/health",
            "issue": "POST /api/credentials/issue",
            "worker": "/api/credentials/worker",
        },
    }))
}

/// GET /api/credentials/health
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(
        SERVICE_NAME,
        state.engine.worker_id().clone(),
    ))
}

/// GET /api/credentials/worker
async fn worker(State(state): State<AppState>) -> Json<WorkerInfo> {
    Json(WorkerInfo {
        worker_id: state.engine.worker_id().clone(),
        timestamp: Timestamp::now(),
    })
}

/// POST /api/credentials/issue: `201` for a new credential, `200` if it
/// was already issued.
async fn issue_credential(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuanceResponse>), AppError> {
    let data = extract_credential_data(body)?;
    let outcome = state.engine.issue_async(data).await?;

    let status = if outcome.already_issued {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(IssuanceResponse {
            success: true,
            message: outcome.message(),
            already_issued: Some(outcome.already_issued),
            credential: Some(outcome.credential),
        }),
    ))
}
