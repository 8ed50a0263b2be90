//! Handlers for the `/lots` resource and its admin counterpart.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use parkwise_core::error::CoreError;
use parkwise_core::types::DbId;
use parkwise_core::{billing, occupancy};
use parkwise_db::ledger::{with_deadline, LotLedger};
use parkwise_db::models::lot::{CreateLot, Lot, UpdateLot};
use parkwise_db::models::session::ParkingSession;
use parkwise_db::repositories::{LotRepo, SessionRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::{LotQuery, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/lots`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "location must be 1-500 characters"))]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub capacity: i32,
    pub fee_rate: f64,
}

/// Request body for `PUT /admin/lots/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500, message = "location must be 1-500 characters"))]
    pub location: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub fee_rate: Option<f64>,
}

impl From<UpdateLotRequest> for UpdateLot {
    fn from(req: UpdateLotRequest) -> Self {
        Self {
            name: req.name,
            location: req.location,
            description: req.description,
            capacity: req.capacity,
            fee_rate: req.fee_rate,
        }
    }
}

/// GET /api/v1/lots
///
/// `?id=&name=&location=&limit=&offset=`, ordered by id ascending.
pub async fn list_lots(
    State(state): State<AppState>,
    Query(params): Query<LotQuery>,
) -> AppResult<Json<DataResponse<Vec<Lot>>>> {
    let (limit, offset) = params.window();
    let lots = LotRepo::list(&state.pool, &params.filter(), limit, offset).await?;
    Ok(Json(DataResponse { data: lots }))
}

/// GET /api/v1/lots/{id}
pub async fn get_lot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Lot>>> {
    let lot = LotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Lot", id }))?;
    Ok(Json(DataResponse { data: lot }))
}

/// POST /api/v1/admin/lots
pub async fn create_lot(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateLotRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Lot>>)> {
    input.validate()?;
    reject_blank("name", &input.name)?;
    reject_blank("location", &input.location)?;
    occupancy::validate_capacity(input.capacity)?;
    billing::validate_fee_rate(input.fee_rate)?;

    let lot = LotRepo::create(
        &state.pool,
        &CreateLot {
            name: input.name.trim().to_string(),
            location: input.location.trim().to_string(),
            description: input.description,
            capacity: input.capacity,
            fee_rate: input.fee_rate,
        },
    )
    .await?;

    tracing::info!(lot_id = lot.id, admin_id = admin.user_id, capacity = lot.capacity, "Lot created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: lot })))
}

/// PUT /api/v1/admin/lots/{id}
///
/// Partial update; capacity may not drop below current occupancy.
pub async fn update_lot(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLotRequest>,
) -> AppResult<Json<DataResponse<Lot>>> {
    input.validate()?;
    let update = UpdateLot::from(input);
    let lot = with_deadline(
        state.config.transaction_timeout(),
        LotLedger::update(&state.pool, id, &update),
    )
    .await?;
    Ok(Json(DataResponse { data: lot }))
}

/// GET /api/v1/admin/lots/{id}/sessions
pub async fn list_lot_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ParkingSession>>>> {
    if LotRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound { entity: "Lot", id }));
    }
    let (limit, offset) = page.window();
    let sessions = SessionRepo::list_for_lot(&state.pool, id, limit, offset).await?;
    Ok(Json(DataResponse { data: sessions }))
}

fn reject_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
