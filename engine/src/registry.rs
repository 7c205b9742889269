//! Employee and vehicle registry.
//!
//! Ids are assigned from the store's per-collection sequence. A create is a
//! duplicate when a stored record carries the same descriptive fields.
//! Creates in one collection are serialized in-process; a store with its own
//! uniqueness constraint covers other processes.

use crate::record::{from_document, to_document};
use crate::{
    error::Result, Collection, Confirmation, DocumentStore, Employee, EmployeeId, Error, Filter,
    KeyedLocks, NewEmployee, NewVehicle, StoreError, Vehicle, VehicleId,
};
use std::sync::Arc;

/// Create, look up and delete employees and vehicles.
#[derive(Clone)]
pub struct EntityRegistry {
    store: Arc<dyn DocumentStore>,
    creates: Arc<KeyedLocks<Collection>>,
}

impl EntityRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            creates: Arc::new(KeyedLocks::new()),
        }
    }

    /// Register a new employee.
    pub async fn create_employee(&self, new: NewEmployee) -> Result<Employee> {
        let _guard = self.creates.lock(Collection::Employees).await;
        let duplicate = Filter::new()
            .eq("name", new.name.as_str())
            .eq("department", new.department.as_str());
        if self.store.find_one(Collection::Employees, &duplicate).await?.is_some() {
            tracing::warn!(name = %new.name, department = %new.department, "employee already exists");
            return Err(Error::AlreadyExists(Collection::Employees));
        }

        let employee = Employee {
            id: self.store.next_sequence(Collection::Employees).await?,
            name: new.name,
            department: new.department,
        };
        let doc = to_document(Collection::Employees, &employee)?;
        self.store
            .insert_one(Collection::Employees, doc)
            .await
            .map_err(|e| already_exists_on_duplicate(e, Collection::Employees))?;

        tracing::info!(employee_id = employee.id, "employee created");
        Ok(employee)
    }

    pub async fn get_employee(&self, id: EmployeeId) -> Result<Employee> {
        let found = self
            .store
            .find_one(Collection::Employees, &Filter::new().eq("id", id))
            .await?
            .ok_or(Error::NotFound(Collection::Employees))?;
        Ok(from_document(Collection::Employees, found.body)?)
    }

    pub async fn delete_employee(&self, id: EmployeeId) -> Result<Confirmation> {
        self.delete(Collection::Employees, id).await
    }

    /// Register a new vehicle.
    pub async fn create_vehicle(&self, new: NewVehicle) -> Result<Vehicle> {
        let _guard = self.creates.lock(Collection::Vehicles).await;
        let duplicate = Filter::new()
            .eq("model", new.model.as_str())
            .eq("driverId", new.driver_id)
            .eq("driverName", new.driver_name.as_str());
        if self.store.find_one(Collection::Vehicles, &duplicate).await?.is_some() {
            tracing::warn!(model = %new.model, driver_id = new.driver_id, "vehicle already exists");
            return Err(Error::AlreadyExists(Collection::Vehicles));
        }

        let vehicle = Vehicle {
            id: self.store.next_sequence(Collection::Vehicles).await?,
            model: new.model,
            driver_id: new.driver_id,
            driver_name: new.driver_name,
        };
        let doc = to_document(Collection::Vehicles, &vehicle)?;
        self.store
            .insert_one(Collection::Vehicles, doc)
            .await
            .map_err(|e| already_exists_on_duplicate(e, Collection::Vehicles))?;

        tracing::info!(vehicle_id = vehicle.id, "vehicle created");
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        let found = self
            .store
            .find_one(Collection::Vehicles, &Filter::new().eq("id", id))
            .await?
            .ok_or(Error::NotFound(Collection::Vehicles))?;
        Ok(from_document(Collection::Vehicles, found.body)?)
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<Confirmation> {
        self.delete(Collection::Vehicles, id).await
    }

    // Allocations referencing the record are left in place.
    async fn delete(&self, collection: Collection, id: i64) -> Result<Confirmation> {
        let deleted = self
            .store
            .delete_one(collection, &Filter::new().eq("id", id))
            .await?;

        if deleted == 0 {
            tracing::warn!(%collection, id, "delete of unknown record");
            return Err(Error::NotFound(collection));
        }

        tracing::info!(%collection, id, "record deleted");
        Ok(Confirmation::deleted(collection))
    }
}

fn already_exists_on_duplicate(err: StoreError, collection: Collection) -> Error {
    match err {
        StoreError::Duplicate { .. } => {
            tracing::warn!(%collection, "record already exists in store");
            Error::AlreadyExists(collection)
        }
        other => Error::Store(other),
    }
}
