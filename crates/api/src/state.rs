use std::sync::Arc;

use spartan_cloud::SharedStorage;
use spartan_core::media::MediaPipeline;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: spartan_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Bucket holding post media and thumbnails.
    pub storage: SharedStorage,
    /// Upload processing (conversion, resizing, thumbnails).
    pub media: Arc<MediaPipeline>,
    /// Per-client request counter.
    pub rate_limiter: Arc<RateLimiter>,
}
