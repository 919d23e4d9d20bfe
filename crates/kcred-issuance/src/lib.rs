//! # kcred-issuance — Credential Issuance Service
//!
//! Issues credentials idempotently: the same payload always maps to the same
//! stored credential, whichever replica handles the request and however many
//! times it is submitted.
//!
//! ## API Surface
//!
//! | Route                          | Handler                  |
//! |--------------------------------|--------------------------|
//! | `GET /`                        | service descriptor       |
//! | `GET /api/credentials/health`  | health with worker id    |
//! | `POST /api/credentials/issue`  | [`engine::IssuanceEngine::issue`] |
//! | `GET /api/credentials/worker`  | worker id                |
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
