//! One-time startup steps, run after migrations and before serving requests.

use sqlx::PgPool;

use crate::models::lot::CreateLot;
use crate::models::user::CreateUser;
use crate::repositories::{LotRepo, UserRepo};

/// Outcome of [`normalize`], for startup logging.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Lots whose occupancy counter disagreed with their active sessions.
    pub lots_reconciled: usize,
}

/// Realign every lot's occupancy with its active sessions. Idempotent.
///
/// Session statuses need no repair here: `ck_sessions_status` only admits
/// the canonical upper-case forms.
pub async fn normalize(pool: &PgPool) -> Result<NormalizeReport, sqlx::Error> {
    let drift = LotRepo::reconcile_occupancy(pool).await?;
    for (lot_id, previous, corrected) in &drift {
        tracing::warn!(lot_id, previous, corrected, "Corrected lot occupancy drift");
    }

    Ok(NormalizeReport {
        lots_reconciled: drift.len(),
    })
}

/// Create `input` unless a user with that username already exists.
///
/// Returns `true` when a user was created.
pub async fn ensure_user(pool: &PgPool, input: &CreateUser) -> Result<bool, sqlx::Error> {
    if UserRepo::find_by_username(pool, &input.username).await?.is_some() {
        return Ok(false);
    }
    let user = UserRepo::create(pool, input).await?;
    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "Bootstrap user created");
    Ok(true)
}

/// The demo lots inserted by [`seed_demo_lots`].
pub fn demo_lots() -> Vec<CreateLot> {
    vec![
        CreateLot {
            name: "Downtown Parking A".into(),
            location: "123 Main Street, Downtown".into(),
            description: "24/7 secure parking near the subway station".into(),
            capacity: 100,
            fee_rate: 10.0,
        },
        CreateLot {
            name: "Business District Parking B".into(),
            location: "456 Commerce Ave, Business District".into(),
            description: "Premium parking with EV charging stations".into(),
            capacity: 200,
            fee_rate: 15.0,
        },
        CreateLot {
            name: "Shopping Mall Parking C".into(),
            location: "789 Retail Road, Shopping District".into(),
            description: "Covered parking with direct mall access".into(),
            capacity: 300,
            fee_rate: 8.0,
        },
    ]
}

/// Insert the demo lots when the `lots` table is empty.
///
/// Returns the number of lots inserted.
pub async fn seed_demo_lots(pool: &PgPool) -> Result<usize, sqlx::Error> {
    if LotRepo::count(pool).await? > 0 {
        return Ok(0);
    }
    let lots = demo_lots();
    for lot in &lots {
        LotRepo::create(pool, lot).await?;
    }
    tracing::info!(count = lots.len(), "Seeded demo lots");
    Ok(lots.len())
}
