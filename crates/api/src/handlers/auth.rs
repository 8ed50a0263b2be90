//! Handlers for the `/auth` resource (register, login, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parkwise_core::error::CoreError;
use parkwise_core::roles::UserRole;
use parkwise_db::models::user::{CreateUser, UserResponse};
use parkwise_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Self-service registration. Always creates a `customer`.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    let user = create_account(&state, &input.username, &input.password, UserRole::Customer).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password and issue an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid username or password".into()));

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    let access_token = generate_access_token(user.id, user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expires_in_secs(),
        user: user.into(),
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    Ok(Json(DataResponse { data: user.into() }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check the password policy, hash, and insert a new account.
///
/// The caller validates the username shape. A racing duplicate that slips
/// past the lookup still surfaces as 409 through `uq_users_username`.
pub(crate) async fn create_account(
    state: &AppState,
    username: &str,
    password: &str,
    role: UserRole,
) -> AppResult<UserResponse> {
    validate_password_strength(password, state.config.min_password_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    if UserRepo::find_by_username(&state.pool, username).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Username '{username}' is already taken"
        ))));
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");
    Ok(user.into())
}
