//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use fleet_engine::DateGranularity;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Precision at which allocation dates collide
    pub granularity: DateGranularity,
    pub list_limit: usize,
}

/// Root response.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
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
        granularity: state.config.granularity,
        list_limit: state.config.list_limit,
    })
}

/// Root handler.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Vehicle Allocation API".to_string(),
    })
}
