//! # kcred-verification — Credential Verification Service
//!
//! Answers "was this payload issued, and by whom?" by consulting the
//! issuance service through [`kcred_issuance_client::IssuanceOracle`], and
//! keeps an append-only log of every verdict.
//!
//! ## API Surface
//!
//! | Route                            | Handler                  |
//! |----------------------------------|--------------------------|
//! | `GET /`                          | service descriptor       |
//! | `GET /api/verification/health`   | health with worker id    |
//! | `POST /api/verification/verify`  | [`engine::VerificationEngine::verify`] |
//! | `GET /api/verification/worker`   | worker id                |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsLayer → Handler
//! ```

pub mod engine;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}
