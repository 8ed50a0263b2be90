//! Route definitions for the `/sessions` resource. All routes require auth.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// ```text
/// POST /            -> enter_lot
/// GET  /mine        -> list_my_sessions
/// GET  /parked      -> list_parked_sessions
/// GET  /{id}        -> get_session (owner or admin)
/// POST /{id}/exit   -> exit_session (owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::enter_lot))
        .route("/mine", get(sessions::list_my_sessions))
        .route("/parked", get(sessions::list_parked_sessions))
        .route("/{id}", get(sessions::get_session))
        .route("/{id}/exit", post(sessions::exit_session))
}
