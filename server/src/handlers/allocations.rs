//! Allocation handlers.

use crate::error::{AppError, Result};
use fleet_engine::{Allocation, AllocationDate, AllocationEngine, Confirmation, NewAllocation};
use serde::Deserialize;
use serde_json::Value;

/// Request body for creating or replacing an allocation.
#[derive(Debug, Deserialize)]
pub struct AllocationRequest {
    pub employee_id: i64,
    pub vehicle_id: i64,
    /// ISO-8601 date or date-time; UTC is assumed when no offset is given
    pub allocation_date: String,
}

impl AllocationRequest {
    fn into_new(self) -> Result<NewAllocation> {
        Ok(NewAllocation {
            employee_id: self.employee_id,
            vehicle_id: self.vehicle_id,
            allocation_date: AllocationDate::parse(&self.allocation_date)?,
        })
    }
}

/// Query parameters for the allocation report.
///
/// Empty values (`?vehicle_id=`) are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub vehicle_id: Option<String>,
    pub employee_id: Option<String>,
}

fn parse_id_filter(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{name} must be an integer"))),
    }
}

/// Create an allocation.
pub async fn handle_create_allocation(
    engine: &AllocationEngine,
    request: AllocationRequest,
) -> Result<Allocation> {
    Ok(engine.create_allocation(request.into_new()?).await?)
}

/// Fetch one allocation.
pub async fn handle_get_allocation(engine: &AllocationEngine, id: &str) -> Result<Allocation> {
    Ok(engine.get_allocation(id).await?)
}

/// Replace an allocation.
///
/// An elapsed allocation is locked whatever the body says, so the body is
/// decoded only after that check.
pub async fn handle_update_allocation(
    engine: &AllocationEngine,
    id: &str,
    body: Value,
) -> Result<Allocation> {
    engine.check_editable(id).await?;

    let request: AllocationRequest = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("invalid allocation body: {e}")))?;
    Ok(engine.update_allocation(id, request.into_new()?).await?)
}

/// Delete an allocation.
pub async fn handle_delete_allocation(engine: &AllocationEngine, id: &str) -> Result<Confirmation> {
    Ok(engine.delete_allocation(id).await?)
}

/// List allocations, capped by the engine's list limit.
pub async fn handle_list_allocations(engine: &AllocationEngine) -> Result<Vec<Allocation>> {
    Ok(engine.list_allocations().await?)
}

/// Allocations filtered by vehicle and/or employee.
pub async fn handle_allocation_report(
    engine: &AllocationEngine,
    query: ReportQuery,
) -> Result<Vec<Allocation>> {
    let vehicle_id = parse_id_filter("vehicle_id", query.vehicle_id.as_deref())?;
    let employee_id = parse_id_filter("employee_id", query.employee_id.as_deref())?;
    Ok(engine.fetch_allocation_report(vehicle_id, employee_id).await?)
}
