//! HTTP route definitions.

mod allocations;
mod employees;
mod health;
mod vehicles;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(employees::routes())
        .merge(vehicles::routes())
        .merge(allocations::routes())
}
