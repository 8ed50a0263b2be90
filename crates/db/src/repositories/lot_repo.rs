//! Repository for the `lots` table.

use parkwise_core::search::substring_pattern;
use parkwise_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::lot::{CreateLot, Lot, LotFilter, UpdateLot};

/// Column list shared across queries; `available` is derived.
pub(crate) const COLUMNS: &str = "id, name, location, description, capacity, fee_rate, \
                                  occupancy, (occupancy < capacity) AS available, \
                                  created_at, updated_at";

/// Provides reads and administrative writes for lots.
///
/// Occupancy is never written here except by [`LotRepo::set_occupancy`],
/// which the ledger calls while holding the row lock.
pub struct LotRepo;

impl LotRepo {
    /// Insert a new lot with zero occupancy.
    pub async fn create(pool: &PgPool, input: &CreateLot) -> Result<Lot, sqlx::Error> {
        let query = format!(
            "INSERT INTO lots (name, location, description, capacity, fee_rate)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lot>(&query)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.capacity)
            .bind(input.fee_rate)
            .fetch_one(pool)
            .await
    }

    /// Find a lot by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Lot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lots WHERE id = $1");
        sqlx::query_as::<_, Lot>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Read a lot and take a row lock held until the transaction ends.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Lot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lots WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Lot>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Overwrite the occupancy counter. Callers must hold the row lock.
    pub async fn set_occupancy(
        conn: &mut PgConnection,
        id: DbId,
        occupancy: i32,
    ) -> Result<Lot, sqlx::Error> {
        let query = format!(
            "UPDATE lots SET occupancy = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lot>(&query)
            .bind(id)
            .bind(occupancy)
            .fetch_one(conn)
            .await
    }

    /// Apply the non-`None` fields of `input`. Callers must hold the row lock
    /// and have validated the capacity against the current occupancy.
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateLot,
    ) -> Result<Lot, sqlx::Error> {
        let query = format!(
            "UPDATE lots SET
                name = COALESCE($2, name),
                location = COALESCE($3, location),
                description = COALESCE($4, description),
                capacity = COALESCE($5, capacity),
                fee_rate = COALESCE($6, fee_rate)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lot>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.capacity)
            .bind(input.fee_rate)
            .fetch_one(conn)
            .await
    }

    /// List lots matching `filter`, ordered by id ascending.
    ///
    /// Text criteria are case-insensitive substring matches; `None` fields
    /// do not constrain the result.
    pub async fn list(
        pool: &PgPool,
        filter: &LotFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lot>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM lots WHERE TRUE"));

        if let Some(id) = filter.id {
            builder.push(" AND id = ").push_bind(id);
        }
        if let Some(name) = &filter.name {
            builder
                .push(" AND name ILIKE ")
                .push_bind(substring_pattern(name));
        }
        if let Some(location) = &filter.location {
            builder
                .push(" AND location ILIKE ")
                .push_bind(substring_pattern(location));
        }

        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder.build_query_as::<Lot>().fetch_all(pool).await
    }

    /// Total number of lots.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lots")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Recompute every lot's occupancy from its active sessions.
    ///
    /// Returns `(lot_id, previous, corrected)` for each lot that drifted.
    pub async fn reconcile_occupancy(pool: &PgPool) -> Result<Vec<(DbId, i32, i32)>, sqlx::Error> {
        sqlx::query_as(
            "WITH counted AS (
                 SELECT l.id, l.occupancy AS previous,
                        COUNT(s.id)::INTEGER AS actual
                 FROM lots l
                 LEFT JOIN sessions s
                        ON s.lot_id = l.id AND s.status IN ('PARKED', 'PAID')
                 GROUP BY l.id, l.occupancy
             )
             UPDATE lots SET occupancy = counted.actual
             FROM counted
             WHERE lots.id = counted.id AND lots.occupancy <> counted.actual
             RETURNING lots.id, counted.previous, counted.actual",
        )
        .fetch_all(pool)
        .await
    }
}
