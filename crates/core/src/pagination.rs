//! Limits for list endpoints.

/// Posts returned by feed-style listings when no `limit` is given.
pub const DEFAULT_POST_LIMIT: i64 = 50;

/// Hard ceiling on posts returned by one listing request.
pub const MAX_POST_LIMIT: i64 = 100;

/// Users returned by a search.
pub const SEARCH_RESULT_LIMIT: i64 = 20;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
