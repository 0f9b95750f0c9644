//! Repository for the `post_likes` table and the `posts.likes` counter.
//!
//! The counter only moves when a like row is actually inserted or removed, so
//! repeating a like or an unlike leaves it unchanged.

use sqlx::PgPool;
use spartan_core::types::DbId;

use crate::models::post::LikeState;

/// Provides like/unlike operations.
pub struct LikeRepo;

impl LikeRepo {
    /// Like a post. Returns `None` if the post does not exist.
    pub async fn like(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar("SELECT likes FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let inserted = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)
             ON CONFLICT (post_id, user_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let likes = if inserted > 0 {
            sqlx::query_scalar("UPDATE posts SET likes = likes + 1 WHERE id = $1 RETURNING likes")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?
        } else {
            current
        };

        tx.commit().await?;
        Ok(Some(LikeState { liked: true, likes }))
    }

    /// Remove a like. Returns `None` if the post does not exist.
    pub async fn unlike(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar("SELECT likes FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let deleted = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let likes = if deleted > 0 {
            sqlx::query_scalar(
                "UPDATE posts SET likes = GREATEST(likes - 1, 0) WHERE id = $1 RETURNING likes",
            )
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            current
        };

        tx.commit().await?;
        Ok(Some(LikeState {
            liked: false,
            likes,
        }))
    }

    /// Current like state of a post for a user. Returns `None` if the post does not exist.
    pub async fn state(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        sqlx::query_as::<_, LikeState>(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = p.id AND user_id = $2) AS liked,
                    p.likes
             FROM posts p
             WHERE p.id = $1",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
