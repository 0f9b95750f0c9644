//! Route definitions for the `/posts` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::posts;
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// The create route accepts bodies up to `max_upload_bytes`; every other
/// route keeps axum's default limit.
///
/// ```text
/// GET    /                 -> list_posts
/// POST   /                 -> create_post (multipart)
/// GET    /{id}             -> get_post
/// PUT    /{id}             -> update_post
/// DELETE /{id}             -> delete_post
/// POST   /{id}/like        -> like_post
/// DELETE /{id}/like        -> unlike_post
/// GET    /{id}/like        -> like_status
/// POST   /{id}/comments    -> create_comment
/// PUT    /comments/{id}    -> update_comment
/// DELETE /comments/{id}    -> delete_comment
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(posts::list_posts)
                .post(posts::create_post)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/{id}/like",
            post(posts::like_post)
                .delete(posts::unlike_post)
                .get(posts::like_status),
        )
        .route("/{id}/comments", post(posts::create_comment))
        .route(
            "/comments/{id}",
            put(posts::update_comment).delete(posts::delete_comment),
        )
}
