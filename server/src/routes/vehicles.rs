//! Vehicle routes.

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use fleet_engine::{Confirmation, Vehicle, VehicleId};

use crate::error::Result;
use crate::handlers::{handle_create_vehicle, handle_delete_vehicle, VehicleRequest};
use crate::AppState;

/// Create vehicle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", post(create_handler))
        .route("/vehicles/", post(create_handler))
        .route("/vehicles/{id}", delete(delete_handler))
}

/// POST /vehicles/ - Register a vehicle.
async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<Vehicle>> {
    let vehicle = handle_create_vehicle(&state.registry, request).await?;
    Ok(Json(vehicle))
}

/// DELETE /vehicles/{id} - Remove a vehicle.
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<VehicleId>,
) -> Result<Json<Confirmation>> {
    let confirmation = handle_delete_vehicle(&state.registry, id).await?;
    Ok(Json(confirmation))
}
