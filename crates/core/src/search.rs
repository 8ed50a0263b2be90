//! Listing and filtering helpers shared by the repository and API layers.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Maximum page size for list endpoints.
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Text filters
// ---------------------------------------------------------------------------

/// Trim a free-text filter, treating blank input as "no filter".
pub fn normalize_filter_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Build an `ILIKE` substring pattern from user input.
///
/// `%`, `_` and `\` are escaped so they match literally under PostgreSQL's
/// default `\` escape character.
///
/// # Examples
///
/// ```
/// use parkwise_core::search::substring_pattern;
/// assert_eq!(substring_pattern("main"), "%main%");
/// assert_eq!(substring_pattern("50%_off"), "%50\\%\\_off%");
/// ```
pub fn substring_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
