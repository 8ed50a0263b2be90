//! Shared query parameter types for API handlers.

use parkwise_core::search::{
    clamp_limit, clamp_offset, normalize_filter_text, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use parkwise_core::types::DbId;
use parkwise_db::models::lot::LotFilter;
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` ready to bind.
    pub fn window(&self) -> (i64, i64) {
        window(self.limit, self.offset)
    }
}

fn window(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        clamp_offset(offset),
    )
}

/// Query parameters for `GET /lots`.
///
/// `name` and `location` are case-insensitive substring filters; blank
/// values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct LotQuery {
    pub id: Option<DbId>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl LotQuery {
    pub fn filter(&self) -> LotFilter {
        LotFilter {
            id: self.id,
            name: normalize_filter_text(self.name.as_deref()),
            location: normalize_filter_text(self.location.as_deref()),
        }
    }

    pub fn window(&self) -> (i64, i64) {
        window(self.limit, self.offset)
    }
}
