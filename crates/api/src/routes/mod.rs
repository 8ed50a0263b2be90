pub mod admin;
pub mod auth;
pub mod health;
pub mod lots;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                 register a customer (public)
/// /auth/login                    login (public)
/// /auth/me                       current user
///
/// /lots                          list with filters (public)
/// /lots/{id}                     single lot (public)
///
/// /sessions                      enter a lot (POST)
/// /sessions/mine                 caller's sessions
/// /sessions/parked               all parked sessions
/// /sessions/{id}                 single session (owner or admin)
/// /sessions/{id}/exit            exit and bill (POST)
///
/// /admin/users                   create user with role (admin)
/// /admin/lots                    create lot (admin)
/// /admin/lots/{id}               update lot (admin, PUT)
/// /admin/lots/{id}/sessions      sessions of one lot (admin)
/// /admin/sessions                every session (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/lots", lots::router())
        .nest("/sessions", sessions::router())
        .nest("/admin", admin::router())
}
