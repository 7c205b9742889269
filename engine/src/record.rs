//! Record types for employees, vehicles and allocations.

use crate::{AllocationDate, Collection, Document, DocumentId, EmployeeId, StoreError, VehicleId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// An employee who can be allocated a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
}

/// Fields supplied when registering an employee. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
}

/// A vehicle and its regular driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    pub model: String,
    pub driver_id: i64,
    pub driver_name: String,
}

/// Fields supplied when registering a vehicle. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub model: String,
    pub driver_id: i64,
    pub driver_name: String,
}

/// The allocation fields as persisted in the allocations collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAllocation {
    pub employee_id: EmployeeId,
    pub vehicle_id: VehicleId,
    pub allocation_date: AllocationDate,
}

/// A stored allocation: one vehicle bound to one employee on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: DocumentId,
    pub employee_id: EmployeeId,
    pub vehicle_id: VehicleId,
    pub allocation_date: AllocationDate,
}

impl Allocation {
    pub fn new(id: DocumentId, fields: NewAllocation) -> Self {
        Self {
            id,
            employee_id: fields.employee_id,
            vehicle_id: fields.vehicle_id,
            allocation_date: fields.allocation_date,
        }
    }

    pub fn fields(&self) -> NewAllocation {
        NewAllocation {
            employee_id: self.employee_id,
            vehicle_id: self.vehicle_id,
            allocation_date: self.allocation_date,
        }
    }
}

/// Acknowledgement returned by delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    pub fn deleted(collection: Collection) -> Self {
        Self {
            message: format!("{} deleted successfully.", collection.entity_name()),
        }
    }
}

/// Serialize a record into a document body.
pub(crate) fn to_document<T: Serialize>(
    collection: Collection,
    value: &T,
) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode {
            collection,
            detail: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(StoreError::Decode {
            collection,
            detail: e.to_string(),
        }),
    }
}

/// Decode a document body into a record.
pub(crate) fn from_document<T: DeserializeOwned>(
    collection: Collection,
    doc: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode {
        collection,
        detail: e.to_string(),
    })
}
