use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parkwise_core::error::CoreError;
use parkwise_db::error::{is_transient, unique_violation};
use parkwise_db::LedgerError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `parkwise_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed Enter, Exit, or lot update transaction.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

type Classified = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Ledger(ledger) => match ledger {
                LedgerError::Rejected(core) => classify_core_error(core),
                LedgerError::Database(err) => classify_sqlx_error(err),
                LedgerError::TimedOut(limit) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "Transaction deadline exceeded");
                    store_unavailable()
                }
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> Classified {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::LotFull { .. } => (StatusCode::CONFLICT, "LOT_FULL", core.to_string()),
        CoreError::AlreadyCompleted { .. } => {
            (StatusCode::CONFLICT, "ALREADY_COMPLETED", core.to_string())
        }
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Transient store failures (pool exhaustion, IO, serialization failure,
///   deadlock) map to 503 so clients know a retry may succeed.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        );
    }
    if let Some(constraint) = unique_violation(err) {
        if constraint.starts_with("uq_") {
            return (
                StatusCode::CONFLICT,
                "CONFLICT",
                conflict_message(constraint),
            );
        }
    }
    if is_transient(err) {
        tracing::warn!(error = %err, "Transient database error");
        return store_unavailable();
    }
    tracing::error!(error = %err, "Database error");
    internal()
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_username" => "Username is already taken".to_string(),
        "uq_sessions_active_vehicle" => "Vehicle is already parked".to_string(),
        "uq_sessions_active_user" => "User already has an active parking session".to_string(),
        other => {
            tracing::warn!(constraint = other, "Unmapped unique constraint violation");
            "Duplicate value".to_string()
        }
    }
}

fn store_unavailable() -> Classified {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "STORE_UNAVAILABLE",
        "The store is temporarily unavailable, please retry".to_string(),
    )
}

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
