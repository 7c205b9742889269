//! Request handlers: shape validation and calls into the engine.

mod allocations;
mod employees;
mod vehicles;

pub use allocations::*;
pub use employees::*;
pub use vehicles::*;

use crate::error::{AppError, Result};

/// Reject blank text fields.
fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}
