//! Parking lot model and DTOs.

use parkwise_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `lots` table.
///
/// `available` is derived in SQL as `occupancy < capacity`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lot {
    pub id: DbId,
    pub name: String,
    pub location: String,
    pub description: String,
    pub capacity: i32,
    pub fee_rate: f64,
    pub occupancy: i32,
    pub available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a lot. Occupancy always starts at zero.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLot {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub capacity: i32,
    pub fee_rate: f64,
}

/// DTO for updating a lot. Only non-`None` fields are applied.
///
/// Occupancy is not updatable here; it changes only through the ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLot {
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub fee_rate: Option<f64>,
}

/// Optional lot search criteria. Text fields match as case-insensitive
/// substrings; blank strings are ignored.
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    pub id: Option<DbId>,
    pub name: Option<String>,
    pub location: Option<String>,
}
