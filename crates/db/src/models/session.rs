//! Parking session model and DTOs.

use parkwise_core::session_status::SessionStatus;
use parkwise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sessions` table: one vehicle's stay in one lot.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingSession {
    pub id: DbId,
    pub user_id: DbId,
    pub lot_id: DbId,
    pub vehicle_id: String,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub amount: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for the Enter transition.
#[derive(Debug, Clone)]
pub struct EnterLot {
    pub user_id: DbId,
    pub lot_id: DbId,
    /// Raw plate as supplied by the caller; normalized by the ledger.
    pub vehicle_id: String,
}
