//! Post entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use spartan_core::types::{DbId, Timestamp};

use super::comment::CommentWithAuthor;

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: DbId,
    pub user_id: DbId,
    pub caption: String,
    pub media_url: String,
    /// `image` or `video`.
    pub media_type: String,
    pub thumbnail_url: Option<String>,
    pub likes: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A post joined with its author and, from the viewer's perspective, like state.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAuthor {
    pub id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub caption: String,
    pub media_url: String,
    pub media_type: String,
    pub thumbnail_url: Option<String>,
    pub likes: i32,
    /// Whether the viewer has liked this post; false when anonymous.
    pub liked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[sqlx(skip)]
    pub comments: Vec<CommentWithAuthor>,
}

/// DTO for creating a new post after its media has been stored.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub user_id: DbId,
    pub caption: String,
    pub media_url: String,
    pub media_type: String,
    pub thumbnail_url: Option<String>,
}

/// Like state of one post for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i32,
}
