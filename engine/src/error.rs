//! Error types for the allocation engine.

use crate::{AllocationDate, Collection, DocumentId, EmployeeId, VehicleId};
use serde::Serialize;
use thiserror::Error;

/// Failures raised by a [`DocumentStore`](crate::DocumentStore) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected the write because of a uniqueness constraint.
    #[error("duplicate key in {collection}: {detail}")]
    Duplicate {
        collection: Collection,
        detail: String,
    },

    /// A stored document could not be decoded into the expected shape.
    #[error("corrupt document in {collection}: {detail}")]
    Decode {
        collection: Collection,
        detail: String,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{} already exists.", .0.entity_name())]
    AlreadyExists(Collection),

    #[error("{} not found.", .0.entity_name())]
    NotFound(Collection),

    // Dangling employee_id / vehicle_id on an allocation write
    #[error("{} not found.", .collection.entity_name())]
    ReferenceNotFound { collection: Collection, id: i64 },

    #[error("Vehicle already allocated for this date.")]
    Conflict {
        vehicle_id: VehicleId,
        allocation_date: AllocationDate,
    },

    #[error("Invalid allocation date: {0}")]
    InvalidDate(String),

    #[error("Invalid allocation ID format.")]
    InvalidId(String),

    #[error("Cannot modify an allocation whose date has already passed.")]
    PastDateLocked(DocumentId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    ReferenceNotFound,
    Conflict,
    InvalidDate,
    InvalidId,
    PastDateLocked,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ReferenceNotFound => "reference_not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidDate => "invalid_date",
            ErrorKind::InvalidId => "invalid_id",
            ErrorKind::PastDateLocked => "past_date_locked",
            ErrorKind::Store => "store",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The kind of this error, used by callers to pick a transport status.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::InvalidDate(_) => ErrorKind::InvalidDate,
            Error::InvalidId(_) => ErrorKind::InvalidId,
            Error::PastDateLocked(_) => ErrorKind::PastDateLocked,
            Error::Store(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn missing_employee(id: EmployeeId) -> Self {
        Error::ReferenceNotFound {
            collection: Collection::Employees,
            id,
        }
    }

    pub(crate) fn missing_vehicle(id: VehicleId) -> Self {
        Error::ReferenceNotFound {
            collection: Collection::Vehicles,
            id,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
