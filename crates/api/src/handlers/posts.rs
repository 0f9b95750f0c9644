//! Handlers for the `/posts` resource, including likes and comments.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use spartan_core::error::CoreError;
use spartan_core::media::MediaAsset;
use spartan_core::types::DbId;
use spartan_db::models::comment::CommentWithAuthor;
use spartan_db::models::post::{CreatePost, LikeState, Post, PostWithAuthor};
use spartan_db::repositories::{CommentRepo, LikeRepo, PostRepo};

use super::{media_urls, remove_stored_media};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::PaginationParams;
use crate::response::MessageResponse;
use crate::state::AppState;

const THUMBNAIL_FILENAME: &str = "thumbnail.jpg";
const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PUT /posts/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub caption: String,
}

/// Request body for creating or editing a comment.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<PostWithAuthor>>> {
    let (limit, offset) = params.posts();
    let posts = PostRepo::list_recent(&state.pool, viewer.user_id(), limit, offset).await?;
    Ok(Json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<PostWithAuthor>> {
    let post = PostRepo::find_with_author(&state.pool, id, viewer.user_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(post))
}

/// POST /api/posts
///
/// Accepts a multipart form with a required `file` field and an optional
/// `caption`. The upload runs through the media pipeline before it is stored;
/// the post row is only written once the media is in the bucket.
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostWithAuthor>)> {
    let mut upload: Option<MediaAsset> = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some(MediaAsset {
                    data: data.to_vec(),
                    content_type,
                    filename,
                });
            }
            "caption" => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let asset = upload.ok_or_else(|| AppError::BadRequest("Media file is required".into()))?;
    if asset.data.is_empty() {
        return Err(AppError::BadRequest("Media file is empty".into()));
    }
    let original_name = asset.filename.clone();

    let processed = state.media.process(asset).await?;
    let kind = processed.kind;
    let stored_name = processed.file_name(&original_name);

    let media_url = state
        .storage
        .upload(processed.data, &stored_name, &processed.content_type)
        .await?;

    let thumbnail_url = match processed.thumbnail {
        Some(thumb) => match state
            .storage
            .upload(thumb, THUMBNAIL_FILENAME, THUMBNAIL_CONTENT_TYPE)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store video thumbnail");
                None
            }
        },
        None => None,
    };

    let create = CreatePost {
        user_id: auth.user_id,
        caption: caption.trim().to_string(),
        media_url,
        media_type: kind.as_str().to_string(),
        thumbnail_url,
    };

    let post = match PostRepo::create(&state.pool, &create).await {
        Ok(post) => post,
        Err(e) => {
            let urls = media_urls(&create.media_url, create.thumbnail_url.as_deref());
            remove_stored_media(state.storage.as_ref(), urls).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = %auth.user_id,
        post_id = %post.id,
        media_type = %post.media_type,
        "Post created",
    );

    let post = PostRepo::find_with_author(&state.pool, post.id, Some(auth.user_id))
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Post",
            id: post.id,
        }))?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePostRequest>,
) -> AppResult<Json<PostWithAuthor>> {
    PostRepo::update_caption(&state.pool, id, auth.user_id, input.caption.trim())
        .await?
        .ok_or_else(not_found_or_not_owned)?;

    let post = PostRepo::find_with_author(&state.pool, id, Some(auth.user_id))
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let post = PostRepo::delete(&state.pool, id, Some(auth.user_id))
        .await?
        .ok_or_else(not_found_or_not_owned)?;

    tracing::info!(user_id = %auth.user_id, post_id = %id, "Post deleted");
    remove_post_media(&state, &post).await;

    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

/// POST /api/posts/{id}/like
pub async fn like_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<LikeState>> {
    let like = LikeRepo::like(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(like))
}

/// DELETE /api/posts/{id}/like
pub async fn unlike_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<LikeState>> {
    let like = LikeRepo::unlike(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(like))
}

/// GET /api/posts/{id}/like
pub async fn like_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<LikeState>> {
    let like = LikeRepo::state(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(like))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// POST /api/posts/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<DbId>,
    Json(input): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<CommentWithAuthor>)> {
    let content = required_content(&input.content)?;
    if !PostRepo::exists(&state.pool, post_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Post",
            id: post_id,
        }));
    }
    let comment = CommentRepo::create(&state.pool, post_id, auth.user_id, content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/posts/comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CommentRequest>,
) -> AppResult<Json<CommentWithAuthor>> {
    let content = required_content(&input.content)?;
    let comment = CommentRepo::update(&state.pool, id, auth.user_id, content)
        .await?
        .ok_or_else(comment_not_found_or_not_owned)?;
    Ok(Json(comment))
}

/// DELETE /api/posts/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !CommentRepo::delete(&state.pool, id, Some(auth.user_id)).await? {
        return Err(comment_not_found_or_not_owned());
    }
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Delete the stored media of a post whose row is already gone.
pub(crate) async fn remove_post_media(state: &AppState, post: &Post) {
    let urls = media_urls(&post.media_url, post.thumbnail_url.as_deref());
    remove_stored_media(state.storage.as_ref(), urls).await;
}

fn required_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Comment content is required"));
    }
    Ok(content)
}

fn not_found_or_not_owned() -> AppError {
    AppError::NotFound("Post not found or you don't have permission to modify it".into())
}

fn comment_not_found_or_not_owned() -> AppError {
    AppError::NotFound("Comment not found or you don't have permission to modify it".into())
}
