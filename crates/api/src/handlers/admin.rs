//! Admin-only user management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parkwise_core::roles::UserRole;
use parkwise_db::models::user::UserResponse;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::auth::create_account;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

/// POST /api/v1/admin/users
///
/// Create an account with an explicit role.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    let user = create_account(&state, &input.username, &input.password, input.role).await?;
    tracing::info!(user_id = user.id, admin_id = admin.user_id, "Admin created user");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}
