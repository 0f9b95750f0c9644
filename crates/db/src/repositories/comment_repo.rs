//! Repository for the `comments` table.

use sqlx::PgPool;
use spartan_core::types::DbId;

use crate::models::comment::{AdminComment, CommentWithAuthor};

/// Provides CRUD operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment, returning it with the author's username.
    pub async fn create(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
        content: &str,
    ) -> Result<CommentWithAuthor, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "WITH inserted AS (
                INSERT INTO comments (post_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, user_id, content, created_at, updated_at
             )
             SELECT i.id, i.post_id, i.user_id, u.username, i.content, i.created_at, i.updated_at
             FROM inserted i
             JOIN users u ON u.id = i.user_id",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// Edit a comment owned by `owner`.
    ///
    /// Returns `None` if the comment does not exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner: DbId,
        content: &str,
    ) -> Result<Option<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "WITH updated AS (
                UPDATE comments SET content = $3, updated_at = NOW()
                WHERE id = $1 AND user_id = $2
                RETURNING id, post_id, user_id, content, created_at, updated_at
             )
             SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at, c.updated_at
             FROM updated c
             JOIN users u ON u.id = c.user_id",
        )
        .bind(id)
        .bind(owner)
        .bind(content)
        .fetch_optional(pool)
        .await
    }

    /// Delete a comment. With `owner` set, only that user's comment matches.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, owner: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM comments WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)")
                .bind(id)
                .bind(owner)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Comments on any of `post_ids`, oldest first.
    pub async fn list_for_posts(
        pool: &PgPool,
        post_ids: &[DbId],
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at, c.updated_at
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ANY($1)
             ORDER BY c.created_at ASC",
        )
        .bind(post_ids)
        .fetch_all(pool)
        .await
    }

    /// Every comment with author and post caption, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminComment>, sqlx::Error> {
        sqlx::query_as::<_, AdminComment>(
            "SELECT c.id, c.post_id, c.user_id, u.username, p.caption AS post_caption,
                    c.content, c.created_at
             FROM comments c
             JOIN users u ON u.id = c.user_id
             JOIN posts p ON p.id = c.post_id
             ORDER BY c.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
