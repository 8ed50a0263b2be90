//! Occupancy rules for the lot ledger.
//!
//! The database applies these as conditional updates under a row lock; the
//! functions here are the same rules in pure form, used for validation and
//! for disambiguating why a conditional update matched no row.

use crate::error::CoreError;
use crate::types::DbId;

/// Whether a lot with the given counters can accept another vehicle.
pub fn is_available(occupancy: i32, capacity: i32) -> bool {
    occupancy < capacity
}

/// Occupancy after admitting one vehicle, or [`CoreError::LotFull`].
pub fn occupy(lot_id: DbId, occupancy: i32, capacity: i32) -> Result<i32, CoreError> {
    if !is_available(occupancy, capacity) {
        return Err(CoreError::LotFull { lot_id });
    }
    Ok(occupancy + 1)
}

/// Occupancy after releasing one vehicle.
///
/// Releasing from an empty lot means a session was exited twice or the
/// counter drifted; that is reported as a conflict instead of being clamped.
pub fn vacate(lot_id: DbId, occupancy: i32) -> Result<i32, CoreError> {
    if occupancy <= 0 {
        return Err(CoreError::Conflict(format!(
            "Lot {lot_id} has no occupied slot to release"
        )));
    }
    Ok(occupancy - 1)
}

/// Validate a lot capacity value.
pub fn validate_capacity(capacity: i32) -> Result<(), CoreError> {
    if capacity <= 0 {
        return Err(CoreError::Validation(format!(
            "capacity must be a positive integer, got {capacity}"
        )));
    }
    Ok(())
}

/// Validate a capacity change against the vehicles currently parked.
pub fn validate_capacity_change(
    lot_id: DbId,
    new_capacity: i32,
    occupancy: i32,
) -> Result<(), CoreError> {
    validate_capacity(new_capacity)?;
    if new_capacity < occupancy {
        return Err(CoreError::Conflict(format!(
            "Lot {lot_id} has {occupancy} parked vehicles; capacity cannot drop to {new_capacity}"
        )));
    }
    Ok(())
}
