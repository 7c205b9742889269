//! Vehicle handlers.

use super::require_text;
use crate::error::Result;
use fleet_engine::{Confirmation, EntityRegistry, NewVehicle, Vehicle, VehicleId};
use serde::Deserialize;

/// Request body for registering a vehicle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub model: String,
    pub driver_id: i64,
    pub driver_name: String,
}

/// Register a vehicle.
pub async fn handle_create_vehicle(
    registry: &EntityRegistry,
    request: VehicleRequest,
) -> Result<Vehicle> {
    require_text("model", &request.model)?;
    require_text("driverName", &request.driver_name)?;

    let vehicle = registry
        .create_vehicle(NewVehicle {
            model: request.model,
            driver_id: request.driver_id,
            driver_name: request.driver_name,
        })
        .await?;
    Ok(vehicle)
}

/// Delete a vehicle by id.
pub async fn handle_delete_vehicle(registry: &EntityRegistry, id: VehicleId) -> Result<Confirmation> {
    Ok(registry.delete_vehicle(id).await?)
}
