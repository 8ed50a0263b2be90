use axum::routing::get;
use axum::Router;

use crate::handlers::lots;
use crate::state::AppState;

/// Routes mounted at `/lots`. Public.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(lots::list_lots))
        .route("/{id}", get(lots::get_lot))
}
