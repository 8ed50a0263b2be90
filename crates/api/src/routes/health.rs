use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

/// 200 when the database answers, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label, database) = match parkwise_db::health_check(&state.pool).await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
