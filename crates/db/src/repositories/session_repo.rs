//! Repository for the `sessions` table.
//!
//! Status transitions are not exposed here as free-standing updates; the only
//! writers are [`SessionRepo::insert_parked`] and [`SessionRepo::complete`],
//! both called by the ledger inside its transaction.

use parkwise_core::session_status::{SessionStatus, STATUS_COMPLETED, STATUS_PARKED};
use parkwise_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::session::ParkingSession;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, lot_id, vehicle_id, status, entry_time, exit_time, \
                        amount, created_at, updated_at";

/// SQL predicate matching sessions that still hold a slot.
const ACTIVE_PREDICATE: &str = "status IN ('PARKED', 'PAID')";

/// Provides reads and ledger-owned writes for parking sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Find a session by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ParkingSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Read a session and take a row lock held until the transaction ends.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ParkingSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The active session for a normalized plate, if any.
    pub async fn find_active_by_vehicle<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: &str,
    ) -> Result<Option<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE vehicle_id = $1 AND {ACTIVE_PREDICATE}"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(vehicle_id)
            .fetch_optional(executor)
            .await
    }

    /// The active session held by a user, if any.
    pub async fn find_active_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: DbId,
    ) -> Result<Option<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE user_id = $1 AND {ACTIVE_PREDICATE}"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new `PARKED` session with a zero amount.
    pub async fn insert_parked(
        conn: &mut PgConnection,
        user_id: DbId,
        lot_id: DbId,
        vehicle_id: &str,
        entry_time: Timestamp,
    ) -> Result<ParkingSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, lot_id, vehicle_id, status, entry_time, amount)
             VALUES ($1, $2, $3, $4, $5, 0)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(user_id)
            .bind(lot_id)
            .bind(vehicle_id)
            .bind(STATUS_PARKED)
            .bind(entry_time)
            .fetch_one(conn)
            .await
    }

    /// Mark a session `COMPLETED` with its exit time and fee.
    pub async fn complete(
        conn: &mut PgConnection,
        id: DbId,
        exit_time: Timestamp,
        amount: f64,
    ) -> Result<ParkingSession, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET status = $2, exit_time = $3, amount = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(exit_time)
            .bind(amount)
            .fetch_one(conn)
            .await
    }

    /// Sessions owned by a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Sessions in the given status, newest entry first.
    pub async fn list_by_status(
        pool: &PgPool,
        status: SessionStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE status = $1
             ORDER BY entry_time DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Sessions recorded against one lot, newest first.
    pub async fn list_for_lot(
        pool: &PgPool,
        lot_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE lot_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(lot_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every session, newest first.
    pub async fn list_all(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ParkingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ParkingSession>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
