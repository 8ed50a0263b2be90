//! Route definitions for `/admin`. Every handler requires the admin role.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin, lots, sessions};
use crate::state::AppState;

/// ```text
/// POST /users                -> create_user
/// POST /lots                 -> create_lot
/// PUT  /lots/{id}            -> update_lot
/// GET  /lots/{id}/sessions   -> list_lot_sessions
/// GET  /sessions             -> list_all_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(admin::create_user))
        .route("/lots", post(lots::create_lot))
        .route("/lots/{id}", put(lots::update_lot))
        .route("/lots/{id}/sessions", get(lots::list_lot_sessions))
        .route("/sessions", get(sessions::list_all_sessions))
}
