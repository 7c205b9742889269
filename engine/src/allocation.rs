//! Allocation engine.
//!
//! Owns every rule about allocations:
//!
//! - both referenced employee and vehicle must exist when the allocation is written
//! - a new allocation must lie strictly in the future
//! - a vehicle holds at most one allocation per date (at the configured granularity)
//! - an allocation whose date has passed can no longer be updated or deleted
//!
//! The store underneath knows none of this. Check-then-write sequences are
//! serialized per vehicle with [`KeyedLocks`].

use crate::record::{from_document, to_document};
use crate::lock::KeyGuard;
use crate::{
    error::Result, Allocation, Clock, Collection, Confirmation, DateGranularity, DocumentId,
    DocumentStore, EmployeeId, EntityRegistry, Error, Filter, KeyedLocks, NewAllocation,
    StoreError, StoredDocument, VehicleId,
};
use std::sync::Arc;

/// Default cap on the number of allocations returned by a listing.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Tunables for the allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Precision at which two allocation dates collide.
    pub granularity: DateGranularity,
    /// Maximum number of records returned by [`AllocationEngine::list_allocations`].
    pub list_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity: DateGranularity::default(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Create, read, update, delete and report on allocations.
pub struct AllocationEngine {
    store: Arc<dyn DocumentStore>,
    registry: EntityRegistry,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: KeyedLocks<VehicleId>,
}

impl AllocationEngine {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            registry: EntityRegistry::new(store.clone()),
            store,
            clock,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Book a vehicle for an employee on a future date.
    pub async fn create_allocation(&self, request: NewAllocation) -> Result<Allocation> {
        self.ensure_references(&request).await?;

        let fields = self.normalize(request);
        let now = self.clock.now();
        if !self.config.granularity.is_future(fields.allocation_date, now) {
            tracing::warn!(
                vehicle_id = fields.vehicle_id,
                allocation_date = %fields.allocation_date,
                "allocation date is not in the future"
            );
            return Err(Error::InvalidDate(format!(
                "{} is not in the future",
                fields.allocation_date
            )));
        }

        let _guard = self.locks.lock(fields.vehicle_id).await;
        self.ensure_available(&fields, None).await?;

        let doc = to_document(Collection::Allocations, &fields)?;
        let id = self
            .store
            .insert_one(Collection::Allocations, doc)
            .await
            .map_err(|e| conflict_on_duplicate(e, &fields))?;

        tracing::info!(
            allocation_id = %id,
            employee_id = fields.employee_id,
            vehicle_id = fields.vehicle_id,
            allocation_date = %fields.allocation_date,
            "allocation created"
        );
        Ok(Allocation::new(id, fields))
    }

    /// Fetch one allocation by its string identifier.
    pub async fn get_allocation(&self, id: &str) -> Result<Allocation> {
        let id = DocumentId::parse(id)?;
        tracing::debug!(allocation_id = %id, "fetching allocation");
        self.fetch(&id).await
    }

    /// Fetch an allocation and fail with [`Error::PastDateLocked`] if its
    /// stored date has passed.
    ///
    /// Lets a caller reject edits of elapsed allocations before looking at
    /// the replacement payload. The update and delete paths repeat the check
    /// under the vehicle lock.
    pub async fn check_editable(&self, id: &str) -> Result<Allocation> {
        let id = DocumentId::parse(id)?;
        let existing = self.fetch(&id).await?;
        self.ensure_not_elapsed(&existing)?;
        Ok(existing)
    }

    /// Replace the fields of an allocation that has not yet elapsed.
    ///
    /// The guard looks at the *stored* date; the replacement date itself may
    /// be anywhere in time, but it still may not collide with another
    /// allocation of the target vehicle.
    pub async fn update_allocation(&self, id: &str, request: NewAllocation) -> Result<Allocation> {
        let existing = self.check_editable(id).await?;
        let id = existing.id;
        let fields = self.normalize(request);

        // Unknown vehicles are rejected before their key is ever locked.
        self.ensure_references(&fields).await?;

        let (existing, _guards) = self.lock_existing(&id, Some(fields.vehicle_id)).await?;
        self.ensure_not_elapsed(&existing)?;
        self.ensure_available(&fields, Some(&id)).await?;

        let doc = to_document(Collection::Allocations, &fields)?;
        let updated = self
            .store
            .update_by_id(Collection::Allocations, &id, doc)
            .await
            .map_err(|e| conflict_on_duplicate(e, &fields))?;
        if !updated {
            return Err(Error::NotFound(Collection::Allocations));
        }

        tracing::info!(
            allocation_id = %id,
            employee_id = fields.employee_id,
            vehicle_id = fields.vehicle_id,
            allocation_date = %fields.allocation_date,
            "allocation updated"
        );
        Ok(Allocation::new(id, fields))
    }

    /// Remove an allocation that has not yet elapsed.
    pub async fn delete_allocation(&self, id: &str) -> Result<Confirmation> {
        let id = DocumentId::parse(id)?;

        let (existing, _guards) = self.lock_existing(&id, None).await?;
        self.ensure_not_elapsed(&existing)?;

        let deleted = self.store.delete_by_id(Collection::Allocations, &id).await?;
        if deleted == 0 {
            return Err(Error::NotFound(Collection::Allocations));
        }

        tracing::info!(allocation_id = %id, vehicle_id = existing.vehicle_id, "allocation deleted");
        Ok(Confirmation::deleted(Collection::Allocations))
    }

    /// All allocations in store order, capped at the configured list limit.
    pub async fn list_allocations(&self) -> Result<Vec<Allocation>> {
        let docs = self
            .store
            .find_many(
                Collection::Allocations,
                &Filter::new(),
                Some(self.config.list_limit),
            )
            .await?;

        tracing::debug!(count = docs.len(), "listing allocations");
        docs.into_iter().map(decode).collect()
    }

    /// Allocations matching the optional vehicle and employee filters.
    ///
    /// Both filters are AND-combined. An empty result is reported as
    /// [`Error::NotFound`].
    pub async fn fetch_allocation_report(
        &self,
        vehicle_id: Option<VehicleId>,
        employee_id: Option<EmployeeId>,
    ) -> Result<Vec<Allocation>> {
        let filter = Filter::new()
            .eq_opt("vehicle_id", vehicle_id)
            .eq_opt("employee_id", employee_id);

        let docs = self
            .store
            .find_many(Collection::Allocations, &filter, None)
            .await?;
        if docs.is_empty() {
            tracing::debug!(?vehicle_id, ?employee_id, "allocation report is empty");
            return Err(Error::NotFound(Collection::Allocations));
        }

        tracing::debug!(?vehicle_id, ?employee_id, count = docs.len(), "allocation report");
        docs.into_iter().map(decode).collect()
    }

    fn normalize(&self, request: NewAllocation) -> NewAllocation {
        NewAllocation {
            allocation_date: self.config.granularity.normalize(request.allocation_date),
            ..request
        }
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Allocation> {
        let doc = self
            .store
            .find_by_id(Collection::Allocations, id)
            .await?
            .ok_or(Error::NotFound(Collection::Allocations))?;
        decode(doc)
    }

    /// Read an allocation and hold the locks of its vehicle (and `extra`).
    ///
    /// The document is re-read under the locks; if its vehicle moved in
    /// between, the locks are released and taken again.
    async fn lock_existing(
        &self,
        id: &DocumentId,
        extra: Option<VehicleId>,
    ) -> Result<(Allocation, Vec<KeyGuard<'_, VehicleId>>)> {
        loop {
            let seen = self.fetch(id).await?;
            let guards = self
                .locks
                .lock_all(std::iter::once(seen.vehicle_id).chain(extra))
                .await;

            let current = self.fetch(id).await?;
            if current.vehicle_id == seen.vehicle_id {
                return Ok((current, guards));
            }
        }
    }

    fn ensure_not_elapsed(&self, existing: &Allocation) -> Result<()> {
        let now = self.clock.now();
        if self.config.granularity.is_past(existing.allocation_date, now) {
            tracing::warn!(
                allocation_id = %existing.id,
                allocation_date = %existing.allocation_date,
                "allocation date has passed"
            );
            return Err(Error::PastDateLocked(existing.id.clone()));
        }
        Ok(())
    }

    async fn ensure_references(&self, fields: &NewAllocation) -> Result<()> {
        if let Err(err) = self.registry.get_employee(fields.employee_id).await {
            return Err(match err {
                Error::NotFound(_) => {
                    tracing::warn!(employee_id = fields.employee_id, "allocation references unknown employee");
                    Error::missing_employee(fields.employee_id)
                }
                other => other,
            });
        }

        if let Err(err) = self.registry.get_vehicle(fields.vehicle_id).await {
            return Err(match err {
                Error::NotFound(_) => {
                    tracing::warn!(vehicle_id = fields.vehicle_id, "allocation references unknown vehicle");
                    Error::missing_vehicle(fields.vehicle_id)
                }
                other => other,
            });
        }

        Ok(())
    }

    /// Reject `fields` if another allocation holds the same vehicle and date.
    async fn ensure_available(&self, fields: &NewAllocation, exclude: Option<&DocumentId>) -> Result<()> {
        let filter = Filter::new()
            .eq("vehicle_id", fields.vehicle_id)
            .eq("allocation_date", fields.allocation_date.to_canonical());

        let clashes = self
            .store
            .find_many(Collection::Allocations, &filter, Some(2))
            .await?;

        if clashes.iter().any(|doc| Some(&doc.id) != exclude) {
            tracing::warn!(
                vehicle_id = fields.vehicle_id,
                allocation_date = %fields.allocation_date,
                "vehicle already allocated for this date"
            );
            return Err(conflict(fields));
        }
        Ok(())
    }
}

fn decode(doc: StoredDocument) -> Result<Allocation> {
    let fields: NewAllocation = from_document(Collection::Allocations, doc.body)?;
    Ok(Allocation::new(doc.id, fields))
}

fn conflict(fields: &NewAllocation) -> Error {
    Error::Conflict {
        vehicle_id: fields.vehicle_id,
        allocation_date: fields.allocation_date,
    }
}

// A store-level uniqueness violation is the same double-booking the engine
// checks for, caught by another process.
fn conflict_on_duplicate(err: StoreError, fields: &NewAllocation) -> Error {
    match err {
        StoreError::Duplicate { .. } => conflict(fields),
        other => Error::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllocationDate, EntityRegistry, FixedClock, MemoryStore, NewEmployee, NewVehicle};
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        engine: AllocationEngine,
        clock: FixedClock,
        store: Arc<MemoryStore>,
    }

    async fn fixture(config: EngineConfig) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap());

        let registry = EntityRegistry::new(store.clone());
        registry
            .create_employee(NewEmployee {
                name: "Alice".into(),
                department: "Engineering".into(),
            })
            .await
            .unwrap();
        registry
            .create_vehicle(NewVehicle {
                model: "Toyota".into(),
                driver_id: 1,
                driver_name: "John Doe".into(),
            })
            .await
            .unwrap();

        let engine = AllocationEngine::new(store.clone(), Arc::new(clock.clone()), config);
        Fixture {
            engine,
            clock,
            store,
        }
    }

    fn request(date: &str) -> NewAllocation {
        NewAllocation {
            employee_id: 1,
            vehicle_id: 1,
            allocation_date: AllocationDate::parse(date).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00"))
            .await
            .unwrap();

        let fetched = f.engine.get_allocation(created.id.as_str()).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.allocation_date.to_canonical(), "2030-01-02T09:00:00Z");
    }

    #[tokio::test]
    async fn double_booking_is_a_conflict() {
        let f = fixture(EngineConfig::default()).await;
        f.engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        // Same instant written with another offset
        let err = f
            .engine
            .create_allocation(request("2030-01-02T10:00:00+01:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { vehicle_id: 1, .. }));

        let count = f
            .store
            .count(Collection::Allocations, &Filter::new())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn day_granularity_collapses_time_of_day() {
        let f = fixture(EngineConfig {
            granularity: DateGranularity::Day,
            ..EngineConfig::default()
        })
        .await;

        let created = f
            .engine
            .create_allocation(request("2030-01-05T08:00:00Z"))
            .await
            .unwrap();
        assert_eq!(created.allocation_date.to_canonical(), "2030-01-05T00:00:00Z");

        let err = f
            .engine
            .create_allocation(request("2030-01-05T17:30:00Z"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn dates_not_in_future_are_rejected() {
        let f = fixture(EngineConfig::default()).await;
        for date in ["2029-12-31T00:00:00Z", "2030-01-01T12:00:00Z"] {
            let err = f.engine.create_allocation(request(date)).await.unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidDate, "date: {date}");
        }
    }

    #[tokio::test]
    async fn missing_references() {
        let f = fixture(EngineConfig::default()).await;

        let mut req = request("2030-02-01");
        req.employee_id = 42;
        let err = f.engine.create_allocation(req).await.unwrap_err();
        assert_eq!(err, Error::missing_employee(42));
        assert_eq!(err.to_string(), "Employee not found.");

        let mut req = request("2030-02-01");
        req.vehicle_id = 42;
        let err = f.engine.create_allocation(req).await.unwrap_err();
        assert_eq!(err, Error::missing_vehicle(42));

        let count = f
            .store
            .count(Collection::Allocations, &Filter::new())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn references_are_checked_before_dates() {
        let f = fixture(EngineConfig::default()).await;
        let mut req = request("2000-01-01");
        req.vehicle_id = 9;
        let err = f.engine.create_allocation(req).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ReferenceNotFound);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        let updated = f
            .engine
            .update_allocation(created.id.as_str(), request("2030-01-03T09:00:00Z"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.allocation_date.to_canonical(), "2030-01-03T09:00:00Z");

        let fetched = f.engine.get_allocation(created.id.as_str()).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn update_to_own_date_is_not_a_conflict() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        let updated = f
            .engine
            .update_allocation(created.id.as_str(), created.fields())
            .await;
        assert!(updated.is_ok());
    }

    #[tokio::test]
    async fn update_cannot_double_book() {
        let f = fixture(EngineConfig::default()).await;
        f.engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();
        let second = f
            .engine
            .create_allocation(request("2030-01-03T09:00:00Z"))
            .await
            .unwrap();

        let err = f
            .engine
            .update_allocation(second.id.as_str(), request("2030-01-02T09:00:00Z"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn update_may_move_into_the_past() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        let updated = f
            .engine
            .update_allocation(created.id.as_str(), request("2029-06-01T09:00:00Z"))
            .await
            .unwrap();
        assert_eq!(updated.allocation_date.to_canonical(), "2029-06-01T09:00:00Z");
    }

    #[tokio::test]
    async fn elapsed_allocations_are_locked() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        f.clock.advance(Duration::days(2));

        let err = f
            .engine
            .update_allocation(created.id.as_str(), request("2030-02-01T09:00:00Z"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::PastDateLocked(created.id.clone()));

        let err = f
            .engine
            .delete_allocation(created.id.as_str())
            .await
            .unwrap_err();
        assert_eq!(err, Error::PastDateLocked(created.id.clone()));

        // Still readable
        assert!(f.engine.get_allocation(created.id.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn check_editable_guards_elapsed_allocations() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        assert_eq!(
            f.engine.check_editable(created.id.as_str()).await.unwrap(),
            created
        );

        f.clock.advance(Duration::days(2));
        assert_eq!(
            f.engine.check_editable(created.id.as_str()).await.unwrap_err(),
            Error::PastDateLocked(created.id.clone())
        );
        assert_eq!(
            f.engine.check_editable("nope").await.unwrap_err().kind(),
            crate::ErrorKind::InvalidId
        );
    }

    #[tokio::test]
    async fn elapsed_check_precedes_reference_check() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();
        f.clock.advance(Duration::days(2));

        let mut req = request("2030-02-01T09:00:00Z");
        req.vehicle_id = 77;
        let err = f
            .engine
            .update_allocation(created.id.as_str(), req)
            .await
            .unwrap_err();
        assert_eq!(err, Error::PastDateLocked(created.id.clone()));
    }

    #[tokio::test]
    async fn rejected_updates_leave_no_lock_entries() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        for vehicle_id in 1000..1500 {
            let mut req = request("2030-01-03T09:00:00Z");
            req.vehicle_id = vehicle_id;
            let err = f
                .engine
                .update_allocation(created.id.as_str(), req)
                .await
                .unwrap_err();
            assert_eq!(err, Error::missing_vehicle(vehicle_id));
        }
        assert!(f.engine.locks.is_empty());

        f.engine
            .update_allocation(created.id.as_str(), request("2030-01-04T09:00:00Z"))
            .await
            .unwrap();
        f.engine.delete_allocation(created.id.as_str()).await.unwrap();
        assert!(f.engine.locks.is_empty());
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let f = fixture(EngineConfig::default()).await;
        let created = f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();

        let confirmation = f
            .engine
            .delete_allocation(created.id.as_str())
            .await
            .unwrap();
        assert_eq!(confirmation.message, "Allocation deleted successfully.");

        let err = f
            .engine
            .delete_allocation(created.id.as_str())
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound(Collection::Allocations));

        // The slot is free again
        assert!(f
            .engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid() {
        let f = fixture(EngineConfig::default()).await;
        let req = request("2030-01-02");

        assert_eq!(
            f.engine.get_allocation("nope").await.unwrap_err().kind(),
            crate::ErrorKind::InvalidId
        );
        assert_eq!(
            f.engine.update_allocation("nope", req).await.unwrap_err().kind(),
            crate::ErrorKind::InvalidId
        );
        assert_eq!(
            f.engine.delete_allocation("nope").await.unwrap_err().kind(),
            crate::ErrorKind::InvalidId
        );

        let unknown = DocumentId::generate();
        assert_eq!(
            f.engine.get_allocation(unknown.as_str()).await.unwrap_err(),
            Error::NotFound(Collection::Allocations)
        );
        assert_eq!(
            f.engine
                .update_allocation(unknown.as_str(), req)
                .await
                .unwrap_err(),
            Error::NotFound(Collection::Allocations)
        );
    }

    #[tokio::test]
    async fn list_is_capped() {
        let f = fixture(EngineConfig {
            list_limit: 3,
            ..EngineConfig::default()
        })
        .await;

        for day in 2..=6 {
            f.engine
                .create_allocation(request(&format!("2030-01-0{day}T09:00:00Z")))
                .await
                .unwrap();
        }

        let listed = f.engine.list_allocations().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].allocation_date.to_canonical(), "2030-01-02T09:00:00Z");
    }

    #[tokio::test]
    async fn report_filters() {
        let f = fixture(EngineConfig::default()).await;
        let registry = EntityRegistry::new(f.store.clone());
        registry
            .create_vehicle(NewVehicle {
                model: "Honda".into(),
                driver_id: 2,
                driver_name: "Jane Roe".into(),
            })
            .await
            .unwrap();

        f.engine
            .create_allocation(request("2030-01-02T09:00:00Z"))
            .await
            .unwrap();
        let mut other = request("2030-01-02T09:00:00Z");
        other.vehicle_id = 2;
        f.engine.create_allocation(other).await.unwrap();

        assert_eq!(f.engine.fetch_allocation_report(None, None).await.unwrap().len(), 2);
        assert_eq!(
            f.engine
                .fetch_allocation_report(Some(2), None)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            f.engine
                .fetch_allocation_report(Some(2), Some(1))
                .await
                .unwrap()[0]
                .vehicle_id,
            2
        );
        assert_eq!(
            f.engine
                .fetch_allocation_report(Some(2), Some(5))
                .await
                .unwrap_err(),
            Error::NotFound(Collection::Allocations)
        );
    }
}
