//! Allocation routes.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use fleet_engine::{Allocation, Confirmation};
use serde_json::Value;

use crate::error::Result;
use crate::handlers::{
    handle_allocation_report, handle_create_allocation, handle_delete_allocation,
    handle_get_allocation, handle_list_allocations, handle_update_allocation, AllocationRequest,
    ReportQuery,
};
use crate::AppState;

/// Create allocation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/allocations", get(list_handler).post(create_handler))
        .route("/allocations/", get(list_handler).post(create_handler))
        .route("/allocations/report", get(report_handler))
        .route(
            "/allocations/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

/// POST /allocations/ - Book a vehicle for an employee.
async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<Allocation>> {
    let allocation = handle_create_allocation(&state.allocations, request).await?;
    Ok(Json(allocation))
}

/// GET /allocations/ - List allocations.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Allocation>>> {
    let allocations = handle_list_allocations(&state.allocations).await?;
    Ok(Json(allocations))
}

/// GET /allocations/report - Filtered allocation report.
async fn report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<Allocation>>> {
    let allocations = handle_allocation_report(&state.allocations, query).await?;
    Ok(Json(allocations))
}

/// GET /allocations/{id} - Fetch one allocation.
async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Allocation>> {
    let allocation = handle_get_allocation(&state.allocations, &id).await?;
    Ok(Json(allocation))
}

/// PUT /allocations/{id} - Replace an allocation.
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Allocation>> {
    let allocation = handle_update_allocation(&state.allocations, &id, body).await?;
    Ok(Json(allocation))
}

/// DELETE /allocations/{id} - Remove an allocation.
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Confirmation>> {
    let confirmation = handle_delete_allocation(&state.allocations, &id).await?;
    Ok(Json(confirmation))
}
