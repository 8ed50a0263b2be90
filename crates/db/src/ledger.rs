//! The parking state machine and the lot occupancy ledger.
//!
//! Every transition runs in one transaction that holds a row lock on each
//! lot it touches, so concurrent entries near capacity serialize on the lot
//! row instead of losing increments. Preconditions are checked before any
//! write; a failure anywhere drops the transaction, which rolls it back.

use std::future::Future;
use std::time::Duration;

use parkwise_core::error::CoreError;
use parkwise_core::session_status::SessionStatus;
use parkwise_core::types::{DbId, Timestamp};
use parkwise_core::{billing, occupancy, vehicle};
use sqlx::{PgConnection, PgPool};

use crate::error::{unique_violation, LedgerError};
use crate::models::lot::{Lot, UpdateLot};
use crate::models::session::{EnterLot, ParkingSession};
use crate::repositories::{LotRepo, SessionRepo};

const UQ_ACTIVE_VEHICLE: &str = "uq_sessions_active_vehicle";
const UQ_ACTIVE_USER: &str = "uq_sessions_active_user";

/// Run a ledger operation with an upper bound on its duration.
///
/// When the deadline passes the operation future is dropped, which rolls
/// back its open transaction, and [`LedgerError::TimedOut`] is returned.
pub async fn with_deadline<T, F>(limit: Duration, operation: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Ledger transaction timed out");
            Err(LedgerError::TimedOut(limit))
        }
    }
}

// ---------------------------------------------------------------------------
// Lot ledger
// ---------------------------------------------------------------------------

/// Occupancy counter per lot.
pub struct LotLedger;

impl LotLedger {
    /// Take one slot in a lot. Fails with `NotFound` or `LotFull`.
    ///
    /// Must run inside a transaction; the lot row stays locked until it ends.
    pub async fn occupy(conn: &mut PgConnection, lot_id: DbId) -> Result<Lot, LedgerError> {
        let lot = lock_lot(conn, lot_id).await?;
        let next = occupancy::occupy(lot.id, lot.occupancy, lot.capacity)?;
        Ok(LotRepo::set_occupancy(conn, lot.id, next).await?)
    }

    /// Release one slot in a lot. Fails with `NotFound`, or `Conflict` when
    /// the counter is already zero.
    ///
    /// Must run inside a transaction; the lot row stays locked until it ends.
    pub async fn vacate(conn: &mut PgConnection, lot_id: DbId) -> Result<Lot, LedgerError> {
        let lot = lock_lot(conn, lot_id).await?;
        let next = occupancy::vacate(lot.id, lot.occupancy)?;
        Ok(LotRepo::set_occupancy(conn, lot.id, next).await?)
    }

    /// Apply an administrative update to a lot.
    ///
    /// Capacity may not drop below the vehicles currently parked.
    pub async fn update(pool: &PgPool, lot_id: DbId, input: &UpdateLot) -> Result<Lot, LedgerError> {
        validate_update(input)?;

        let mut tx = pool.begin().await?;
        let lot = lock_lot(&mut tx, lot_id).await?;
        if let Some(capacity) = input.capacity {
            occupancy::validate_capacity_change(lot.id, capacity, lot.occupancy)?;
        }
        let updated = LotRepo::update_fields(&mut tx, lot.id, input).await?;
        tx.commit().await?;

        tracing::info!(
            lot_id,
            capacity = updated.capacity,
            fee_rate = updated.fee_rate,
            "Lot updated"
        );
        Ok(updated)
    }
}

async fn lock_lot(conn: &mut PgConnection, lot_id: DbId) -> Result<Lot, LedgerError> {
    LotRepo::lock_by_id(conn, lot_id)
        .await?
        .ok_or(LedgerError::Rejected(CoreError::NotFound {
            entity: "Lot",
            id: lot_id,
        }))
}

fn validate_update(input: &UpdateLot) -> Result<(), CoreError> {
    for (field, value) in [("name", &input.name), ("location", &input.location)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(CoreError::Validation(format!("{field} must not be blank")));
        }
    }
    if let Some(capacity) = input.capacity {
        occupancy::validate_capacity(capacity)?;
    }
    if let Some(fee_rate) = input.fee_rate {
        billing::validate_fee_rate(fee_rate)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

/// Enter and Exit transitions for parking sessions.
pub struct SessionLedger;

impl SessionLedger {
    /// Park a vehicle: create a `PARKED` session and take a slot in the lot.
    ///
    /// Fails with `Validation` for a malformed plate, `Conflict` when the
    /// vehicle or the user already has an active session, `NotFound` when the
    /// lot does not exist, and `LotFull` when it has no free slot.
    pub async fn enter(
        pool: &PgPool,
        input: &EnterLot,
        at: Timestamp,
    ) -> Result<ParkingSession, LedgerError> {
        let vehicle_id = vehicle::normalize_plate(&input.vehicle_id)?;

        let mut tx = pool.begin().await?;

        if let Some(active) = SessionRepo::find_active_by_vehicle(&mut *tx, &vehicle_id).await? {
            return Err(CoreError::Conflict(format!(
                "Vehicle {vehicle_id} is already parked in lot {}",
                active.lot_id
            ))
            .into());
        }
        if let Some(active) = SessionRepo::find_active_by_user(&mut *tx, input.user_id).await? {
            return Err(CoreError::Conflict(format!(
                "User already has an active parking session ({})",
                active.id
            ))
            .into());
        }

        let lot = LotLedger::occupy(&mut tx, input.lot_id).await?;

        let session =
            SessionRepo::insert_parked(&mut tx, input.user_id, lot.id, &vehicle_id, at)
                .await
                .map_err(|err| active_session_conflict(err, &vehicle_id))?;

        tx.commit().await?;

        tracing::info!(
            session_id = session.id,
            user_id = session.user_id,
            lot_id = lot.id,
            vehicle_id = %session.vehicle_id,
            occupancy = lot.occupancy,
            "Vehicle entered lot"
        );
        Ok(session)
    }

    /// Complete a session: stamp the exit time, bill it, release the slot.
    ///
    /// Fails with `NotFound` when the session does not exist, `Forbidden`
    /// when `requester` does not own it, and `AlreadyCompleted` when it has
    /// already exited. A repeated exit never touches the lot or the amount.
    pub async fn exit(
        pool: &PgPool,
        session_id: DbId,
        requester: DbId,
        at: Timestamp,
    ) -> Result<ParkingSession, LedgerError> {
        let mut tx = pool.begin().await?;

        let session = SessionRepo::lock_by_id(&mut tx, session_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;

        if session.user_id != requester {
            return Err(CoreError::Forbidden(format!(
                "Session {session_id} belongs to another user"
            ))
            .into());
        }
        if session.status.is_terminal() {
            return Err(CoreError::AlreadyCompleted { session_id }.into());
        }
        if !session.status.can_transition_to(SessionStatus::Completed) {
            return Err(CoreError::Conflict(format!(
                "Session {session_id} cannot exit from status {}",
                session.status
            ))
            .into());
        }

        let lot = LotLedger::vacate(&mut tx, session.lot_id).await?;
        let amount = billing::compute_fee(session.entry_time, at, lot.fee_rate)?;
        let completed = SessionRepo::complete(&mut tx, session.id, at, amount).await?;

        tx.commit().await?;

        tracing::info!(
            session_id,
            user_id = requester,
            lot_id = lot.id,
            amount,
            occupancy = lot.occupancy,
            "Vehicle exited lot"
        );
        Ok(completed)
    }
}

/// Map a racing insert that tripped an active-session unique index to the
/// same `Conflict` the pre-check would have produced.
fn active_session_conflict(err: sqlx::Error, vehicle_id: &str) -> LedgerError {
    let constraint = unique_violation(&err).map(str::to_owned);
    match constraint.as_deref() {
        Some(UQ_ACTIVE_VEHICLE) => {
            CoreError::Conflict(format!("Vehicle {vehicle_id} is already parked")).into()
        }
        Some(UQ_ACTIVE_USER) => {
            CoreError::Conflict("User already has an active parking session".into()).into()
        }
        _ => LedgerError::Database(err),
    }
}
