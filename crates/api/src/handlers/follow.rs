//! Handlers for the `/follow` resource and the personal feed.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use spartan_core::error::CoreError;
use spartan_core::types::DbId;
use spartan_db::models::post::PostWithAuthor;
use spartan_db::models::user::UserSummary;
use spartan_db::repositories::{FollowerRepo, PostRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub message: String,
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
}

/// POST /api/follow/{id}
///
/// Following someone already followed succeeds without change.
pub async fn follow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<FollowResponse>> {
    if id == auth.user_id {
        return Err(AppError::BadRequest("Cannot follow yourself".into()));
    }
    ensure_user_exists(&state, id).await?;

    if FollowerRepo::follow(&state.pool, auth.user_id, id).await? {
        tracing::debug!(follower = %auth.user_id, followed = %id, "Follow added");
    }
    Ok(Json(FollowResponse {
        message: "Successfully followed user".into(),
        is_following: true,
    }))
}

/// DELETE /api/follow/{id}
pub async fn unfollow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<FollowResponse>> {
    if id == auth.user_id {
        return Err(AppError::BadRequest("Cannot unfollow yourself".into()));
    }
    ensure_user_exists(&state, id).await?;

    FollowerRepo::unfollow(&state.pool, auth.user_id, id).await?;
    Ok(Json(FollowResponse {
        message: "Successfully unfollowed user".into(),
        is_following: false,
    }))
}

/// GET /api/follow/{id}/status
pub async fn follow_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<FollowStatus>> {
    let is_following = FollowerRepo::is_following(&state.pool, auth.user_id, id).await?;
    Ok(Json(FollowStatus { is_following }))
}

/// GET /api/follow/{id}/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<UserSummary>>> {
    ensure_user_exists(&state, id).await?;
    Ok(Json(FollowerRepo::followers(&state.pool, id).await?))
}

/// GET /api/follow/{id}/following
pub async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<UserSummary>>> {
    ensure_user_exists(&state, id).await?;
    Ok(Json(FollowerRepo::following(&state.pool, id).await?))
}

/// GET /api/follow/feed
///
/// Posts from the accounts the caller follows, newest first.
pub async fn feed(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<PostWithAuthor>>> {
    let (limit, offset) = params.posts();
    let posts = PostRepo::feed(&state.pool, auth.user_id, limit, offset).await?;
    Ok(Json(posts))
}

async fn ensure_user_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if !UserRepo::exists(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    Ok(())
}
