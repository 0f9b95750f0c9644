//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires an administrator.
///
/// ```text
/// GET    /invite-codes        -> list_invite_codes
/// POST   /invite-codes        -> create_invite_code
/// DELETE /invite-codes/{id}   -> delete_invite_code
/// GET    /users               -> list_users
/// DELETE /users/{id}          -> delete_user
/// DELETE /posts/{id}          -> delete_post
/// GET    /comments            -> list_comments
/// DELETE /comments/{id}       -> delete_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/invite-codes",
            get(admin::list_invite_codes).post(admin::create_invite_code),
        )
        .route("/invite-codes/{id}", delete(admin::delete_invite_code))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/posts/{id}", delete(admin::delete_post))
        .route("/comments", get(admin::list_comments))
        .route("/comments/{id}", delete(admin::delete_comment))
}
