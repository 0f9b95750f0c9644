//! Comment entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use spartan_core::types::{DbId, Timestamp};

/// A comment joined with its author's username.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    pub id: DbId,
    pub post_id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment as listed for moderation, with the caption of the post it is on.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminComment {
    pub id: DbId,
    pub post_id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub post_caption: String,
    pub content: String,
    pub created_at: Timestamp,
}
