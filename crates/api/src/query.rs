//! Shared query parameter types for API handlers.

use serde::Deserialize;
use spartan_core::pagination::{clamp_limit, clamp_offset, DEFAULT_POST_LIMIT, MAX_POST_LIMIT};

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `(limit, offset)` clamped for post listings.
    pub fn posts(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_POST_LIMIT, MAX_POST_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Query parameters for `GET /users/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}
