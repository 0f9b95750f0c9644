//! Administrator access control.
//!
//! Admin status is read from `users.is_admin` on every request rather than
//! carried in the token, so revoking it takes effect immediately.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use spartan_db::repositories::UserRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an administrator account. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !UserRepo::is_admin(&state.pool, user.user_id).await? {
            return Err(AppError::forbidden("Admin access required"));
        }
        Ok(RequireAdmin(user))
    }
}
