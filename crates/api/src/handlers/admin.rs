//! Handlers for the `/admin` resource (invite codes and moderation).
//!
//! All handlers require an administrator via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use spartan_core::error::CoreError;
use spartan_core::invite::generate_invite_code;
use spartan_core::types::DbId;
use spartan_db::models::comment::AdminComment;
use spartan_db::models::invite_code::{CreateInviteCode, InviteCode};
use spartan_db::models::user::AdminUserRow;
use spartan_db::repositories::{CommentRepo, InviteCodeRepo, PostRepo, UserRepo};

use super::posts::remove_post_media;
use super::{orphaned_media_urls, remove_stored_media};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/invite-codes`. Without `expiryDays` the code
/// never expires.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub expiry_days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Invite codes
// ---------------------------------------------------------------------------

/// POST /api/admin/invite-codes
pub async fn create_invite_code(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Option<Json<CreateInviteRequest>>,
) -> AppResult<(StatusCode, Json<InviteCode>)> {
    let input = body.map(|Json(b)| b).unwrap_or_default();

    let expires_at = match input.expiry_days {
        Some(days) if days < 0 => {
            return Err(AppError::validation("expiryDays cannot be negative"));
        }
        Some(0) | None => None,
        Some(days) => Some(
            Duration::try_days(days)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .ok_or_else(|| AppError::validation("expiryDays is too large"))?,
        ),
    };

    let invite = InviteCodeRepo::create(
        &state.pool,
        &CreateInviteCode {
            code: generate_invite_code(),
            created_by: admin.user_id,
            expires_at,
        },
    )
    .await?;

    tracing::info!(admin_id = %admin.user_id, invite_id = %invite.id, "Invite code created");
    Ok((StatusCode::CREATED, Json(invite)))
}

/// GET /api/admin/invite-codes
pub async fn list_invite_codes(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<InviteCode>>> {
    Ok(Json(InviteCodeRepo::list(&state.pool).await?))
}

/// DELETE /api/admin/invite-codes/{id}
pub async fn delete_invite_code(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !InviteCodeRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "InviteCode",
            id,
        }));
    }
    Ok(Json(MessageResponse::new("Invite code deleted successfully")))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<AdminUserRow>>> {
    Ok(Json(UserRepo::list_for_admin(&state.pool).await?))
}

/// DELETE /api/admin/users/{id}
///
/// Administrators cannot be deleted here. The invite code the account
/// registered with becomes redeemable again.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let target = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    if target.is_admin {
        return Err(AppError::forbidden("Cannot delete admin users"));
    }

    let media = UserRepo::delete_account_releasing_invite(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(admin_id = %admin.user_id, user_id = %id, "User deleted by admin");

    remove_stored_media(state.storage.as_ref(), orphaned_media_urls(&media)).await;

    Ok(Json(MessageResponse::new("User deleted successfully by admin")))
}

// ---------------------------------------------------------------------------
// Content moderation
// ---------------------------------------------------------------------------

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let post = PostRepo::delete(&state.pool, id, None)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;

    tracing::info!(admin_id = %admin.user_id, post_id = %id, "Post deleted by admin");
    remove_post_media(&state, &post).await;

    Ok(Json(MessageResponse::new("Post deleted successfully by admin")))
}

/// GET /api/admin/comments
pub async fn list_comments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<AdminComment>>> {
    Ok(Json(CommentRepo::list_all(&state.pool).await?))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !CommentRepo::delete(&state.pool, id, None).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }));
    }
    tracing::info!(admin_id = %admin.user_id, comment_id = %id, "Comment deleted by admin");
    Ok(Json(MessageResponse::new("Comment deleted successfully by admin")))
}
