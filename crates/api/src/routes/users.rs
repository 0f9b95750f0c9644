//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /me              -> get_me
/// PUT    /me              -> update_me
/// DELETE /me              -> delete_me
/// PUT    /me/password     -> change_password
/// GET    /search?q=       -> search
/// GET    /{id}/profile    -> get_profile
/// GET    /{id}/posts      -> list_user_posts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(users::get_me)
                .put(users::update_me)
                .delete(users::delete_me),
        )
        .route("/me/password", put(users::change_password))
        .route("/search", get(users::search))
        .route("/{id}/profile", get(users::get_profile))
        .route("/{id}/posts", get(users::list_user_posts))
}
