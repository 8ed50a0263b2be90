//! Handlers for the `/sessions` resource: enter, exit, and listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use parkwise_core::error::CoreError;
use parkwise_core::session_status::SessionStatus;
use parkwise_core::types::DbId;
use parkwise_db::ledger::{with_deadline, SessionLedger};
use parkwise_db::models::session::{EnterLot, ParkingSession};
use parkwise_db::repositories::SessionRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct EnterRequest {
    pub lot_id: DbId,
    pub vehicle_id: String,
}

/// POST /api/v1/sessions
///
/// Park a vehicle for the calling user. The entry time is the server clock.
pub async fn enter_lot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<EnterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ParkingSession>>)> {
    let enter = EnterLot {
        user_id: auth.user_id,
        lot_id: input.lot_id,
        vehicle_id: input.vehicle_id,
    };
    let session = with_deadline(
        state.config.transaction_timeout(),
        SessionLedger::enter(&state.pool, &enter, Utc::now()),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// POST /api/v1/sessions/{id}/exit
///
/// Complete the caller's own session and bill it.
pub async fn exit_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ParkingSession>>> {
    let session = with_deadline(
        state.config.transaction_timeout(),
        SessionLedger::exit(&state.pool, id, auth.user_id, Utc::now()),
    )
    .await?;
    Ok(Json(DataResponse { data: session }))
}

/// GET /api/v1/sessions/mine
pub async fn list_my_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ParkingSession>>>> {
    let (limit, offset) = page.window();
    let sessions = SessionRepo::list_for_user(&state.pool, auth.user_id, limit, offset).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/sessions/parked
///
/// Every session currently in `PARKED`, newest entry first.
pub async fn list_parked_sessions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ParkingSession>>>> {
    let (limit, offset) = page.window();
    let sessions =
        SessionRepo::list_by_status(&state.pool, SessionStatus::Parked, limit, offset).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/sessions/{id}
///
/// Visible to the owner and to admins.
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ParkingSession>>> {
    let session = SessionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Session",
            id,
        }))?;
    if !auth.can_access(session.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Session {id} belongs to another user"
        ))));
    }
    Ok(Json(DataResponse { data: session }))
}

/// GET /api/v1/admin/sessions
pub async fn list_all_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ParkingSession>>>> {
    let (limit, offset) = page.window();
    let sessions = SessionRepo::list_all(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: sessions }))
}
