pub mod admin;
pub mod auth;
pub mod follow;
pub mod health;
pub mod posts;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                          service + database health
///
/// /auth/register                                   register with invite (public)
/// /auth/login                                      login (public)
/// /auth/logout                                     end current session
/// /auth/sessions                                   list own sessions
/// /auth/revoke-session                             revoke one session
/// /auth/revoke-all-sessions                        revoke all other sessions
/// /auth/refresh-token                              re-mint current token
///
/// /users/me                                        get, update, delete own account
/// /users/me/password                               change password
/// /users/search                                    search by username or name
/// /users/{id}/profile                              public profile
/// /users/{id}/posts                                posts by user
///
/// /posts                                           list, create (multipart)
/// /posts/{id}                                      get, update, delete
/// /posts/{id}/like                                 like, unlike, like state
/// /posts/{id}/comments                             add comment
/// /posts/comments/{id}                             edit, delete comment
///
/// /follow/feed                                     posts from followed accounts
/// /follow/{id}                                     follow, unfollow
/// /follow/{id}/status                              whether caller follows
/// /follow/{id}/followers                           followers of user
/// /follow/{id}/following                           accounts user follows
///
/// /admin/invite-codes                              list, create (admin only)
/// /admin/invite-codes/{id}                         delete
/// /admin/users                                     list with activity
/// /admin/users/{id}                                delete non-admin account
/// /admin/posts/{id}                                delete any post
/// /admin/comments                                  list all comments
/// /admin/comments/{id}                             delete any comment
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router(max_upload_bytes))
        .nest("/follow", follow::router())
        .nest("/admin", admin::router())
}
