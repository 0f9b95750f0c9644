//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register             -> register
/// POST /login                -> login
/// POST /logout               -> logout (requires auth)
/// GET  /sessions             -> list_sessions (requires auth)
/// POST /revoke-session       -> revoke_session (requires auth)
/// POST /revoke-all-sessions  -> revoke_all_sessions (requires auth)
/// POST /refresh-token        -> refresh_token (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/sessions", get(auth::list_sessions))
        .route("/revoke-session", post(auth::revoke_session))
        .route("/revoke-all-sessions", post(auth::revoke_all_sessions))
        .route("/refresh-token", post(auth::refresh_token))
}
