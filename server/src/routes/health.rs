//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use autobook_engine::Branch;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub branch: Branch,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        branch: state.sync.branch(),
    })
}

/// Root handler.
async fn root() -> &'static str {
    "Autobook Server"
}
