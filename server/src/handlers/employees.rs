//! Employee handlers.

use super::require_text;
use crate::error::Result;
use fleet_engine::{Confirmation, Employee, EmployeeId, EntityRegistry, NewEmployee};
use serde::Deserialize;

/// Request body for registering an employee.
///
/// Ids are assigned by the store; an `id` sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct EmployeeRequest {
    pub name: String,
    pub department: String,
}

/// Register an employee.
pub async fn handle_create_employee(
    registry: &EntityRegistry,
    request: EmployeeRequest,
) -> Result<Employee> {
    require_text("name", &request.name)?;
    require_text("department", &request.department)?;

    let employee = registry
        .create_employee(NewEmployee {
            name: request.name,
            department: request.department,
        })
        .await?;
    Ok(employee)
}

/// Delete an employee by id.
pub async fn handle_delete_employee(
    registry: &EntityRegistry,
    id: EmployeeId,
) -> Result<Confirmation> {
    Ok(registry.delete_employee(id).await?)
}
