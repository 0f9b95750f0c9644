//! Route definitions for the `/follow` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::follow;
use crate::state::AppState;

/// Routes mounted at `/follow`.
///
/// ```text
/// GET    /feed             -> feed
/// POST   /{id}             -> follow
/// DELETE /{id}             -> unfollow
/// GET    /{id}/status      -> follow_status
/// GET    /{id}/followers   -> list_followers
/// GET    /{id}/following   -> list_following
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feed", get(follow::feed))
        .route("/{id}", post(follow::follow).delete(follow::unfollow))
        .route("/{id}/status", get(follow::follow_status))
        .route("/{id}/followers", get(follow::list_followers))
        .route("/{id}/following", get(follow::list_following))
}
