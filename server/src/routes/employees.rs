//! Employee routes.

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use fleet_engine::{Confirmation, Employee, EmployeeId};

use crate::error::Result;
use crate::handlers::{handle_create_employee, handle_delete_employee, EmployeeRequest};
use crate::AppState;

/// Create employee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", post(create_handler))
        .route("/employees/", post(create_handler))
        .route("/employees/{id}", delete(delete_handler))
}

/// POST /employees/ - Register an employee.
async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<EmployeeRequest>,
) -> Result<Json<Employee>> {
    let employee = handle_create_employee(&state.registry, request).await?;
    Ok(Json(employee))
}

/// DELETE /employees/{id} - Remove an employee.
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
) -> Result<Json<Confirmation>> {
    let confirmation = handle_delete_employee(&state.registry, id).await?;
    Ok(Json(confirmation))
}
