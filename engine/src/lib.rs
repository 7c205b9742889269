//! # Fleet Engine
//!
//! Core rules of the vehicle allocation tracker.
//!
//! The engine manages three kinds of records kept in a document store:
//! employees, vehicles, and allocations binding one vehicle to one employee
//! on one date. It is storage-agnostic: every component receives an
//! explicitly constructed [`DocumentStore`] handle.
//!
//! ## Components
//!
//! - [`DocumentStore`] - persistence contract over the named [`Collection`]s,
//!   queried by field-equality [`Filter`]s. [`MemoryStore`] is the in-process
//!   implementation.
//! - [`EntityRegistry`] - create, fetch and delete employees and vehicles.
//! - [`AllocationEngine`] - allocation lifecycle with referential checks,
//!   temporal guards and double-booking prevention.
//!
//! ## Allocation rules
//!
//! - An allocation may only reference an existing employee and vehicle.
//! - A new allocation must lie strictly in the future.
//! - A vehicle has at most one allocation per date, compared at the
//!   configured [`DateGranularity`].
//! - Once an allocation's date has passed it is read-only.
//!
//! ## Quick Start
//!
//! ```rust
//! use fleet_engine::{
//!     AllocationDate, AllocationEngine, EngineConfig, EntityRegistry, MemoryStore,
//!     NewAllocation, NewEmployee, NewVehicle, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let registry = EntityRegistry::new(store.clone());
//! let engine = AllocationEngine::new(store, Arc::new(SystemClock), EngineConfig::default());
//!
//! let employee = registry
//!     .create_employee(NewEmployee {
//!         name: "Alice".into(),
//!         department: "Engineering".into(),
//!     })
//!     .await
//!     .unwrap();
//! let vehicle = registry
//!     .create_vehicle(NewVehicle {
//!         model: "Toyota".into(),
//!         driver_id: 1,
//!         driver_name: "John Doe".into(),
//!     })
//!     .await
//!     .unwrap();
//!
//! let allocation = engine
//!     .create_allocation(NewAllocation {
//!         employee_id: employee.id,
//!         vehicle_id: vehicle.id,
//!         allocation_date: AllocationDate::parse("2999-01-01T09:00:00Z").unwrap(),
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(engine.list_allocations().await.unwrap(), vec![allocation]);
//! # });
//! ```

pub mod allocation;
pub mod clock;
pub mod date;
pub mod document;
pub mod error;
pub mod lock;
pub mod record;
pub mod registry;
pub mod store;

// Re-export main types at crate root
pub use allocation::{AllocationEngine, EngineConfig, DEFAULT_LIST_LIMIT};
pub use clock::{Clock, FixedClock, SystemClock};
pub use date::{AllocationDate, DateGranularity};
pub use document::{Collection, Document, DocumentId, Filter, StoredDocument};
pub use error::{Error, ErrorKind, StoreError};
pub use lock::{KeyGuard, KeyedLocks};
pub use record::{Allocation, Confirmation, Employee, NewAllocation, NewEmployee, NewVehicle, Vehicle};
pub use registry::EntityRegistry;
pub use store::{DocumentStore, MemoryStore, StoreResult};

/// Type aliases for clarity
pub type EmployeeId = i64;
pub type VehicleId = i64;
