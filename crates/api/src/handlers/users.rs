//! Handlers for the `/users` resource (own account, profiles, search).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use spartan_core::error::CoreError;
use spartan_core::pagination::SEARCH_RESULT_LIMIT;
use spartan_core::types::DbId;
use spartan_db::models::post::PostWithAuthor;
use spartan_db::models::user::{UpdateProfile, UserProfile, UserResponse};
use spartan_db::repositories::{PostRepo, SessionRepo, UserRepo};
use validator::ValidateEmail;

use super::{non_blank, orphaned_media_urls, remove_stored_media};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::{PaginationParams, SearchParams};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /users/me`.
///
/// An absent field keeps its current value; an empty string clears it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateMeResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Request body for `PUT /users/me/password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(user.into()))
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateMeRequest>,
) -> AppResult<Json<UpdateMeResponse>> {
    let current = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    let email = match input.email {
        Some(email) => {
            let email = email.trim().to_string();
            if email.is_empty() {
                return Err(AppError::validation("Email cannot be empty"));
            }
            if !email.validate_email() {
                return Err(AppError::validation("Invalid email address"));
            }
            email
        }
        None => current.email,
    };

    let update = UpdateProfile {
        name: match input.name {
            Some(name) => non_blank(Some(name)),
            None => current.name,
        },
        email,
        phone_number: match input.phone_number {
            Some(phone) => non_blank(Some(phone)),
            None => current.phone_number,
        },
    };

    let user = UserRepo::update_profile(&state.pool, auth.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(UpdateMeResponse {
        message: "User updated successfully".into(),
        user: user.into(),
    }))
}

/// PUT /api/users/me/password
///
/// Requires the current password. Every other session of the account is
/// revoked once the new password is stored.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::validation)?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, auth.user_id, &password_hash).await?;

    let revoked =
        SessionRepo::delete_all_except(&state.pool, auth.user_id, auth.session_id).await?;
    tracing::info!(user_id = %auth.user_id, revoked, "Password changed");

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// DELETE /api/users/me
///
/// Removes the account and everything it owns. Stored media is deleted after
/// the transaction commits.
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    let media = UserRepo::delete_account(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    tracing::info!(user_id = %auth.user_id, posts = media.len(), "Account deleted");

    remove_stored_media(state.storage.as_ref(), orphaned_media_urls(&media)).await;

    Ok(Json(MessageResponse::new("Account deleted successfully")))
}

/// GET /api/users/search?q=
pub async fn search(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(AppError::BadRequest("Search query is required".into()));
    }
    let users = UserRepo::search(&state.pool, term, viewer.user_id(), SEARCH_RESULT_LIMIT).await?;
    Ok(Json(users))
}

/// GET /api/users/{id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserProfile>> {
    let profile = UserRepo::profile(&state.pool, id, viewer.user_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(profile))
}

/// GET /api/users/{id}/posts
pub async fn list_user_posts(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<PostWithAuthor>>> {
    if !UserRepo::exists(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    let (limit, offset) = params.posts();
    let posts = PostRepo::list_by_user(&state.pool, id, viewer.user_id(), limit, offset).await?;
    Ok(Json(posts))
}
