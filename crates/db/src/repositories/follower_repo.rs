//! Repository for the `followers` table.

use sqlx::PgPool;
use spartan_core::types::DbId;

use crate::models::user::UserSummary;

/// Provides follow-graph operations.
pub struct FollowerRepo;

impl FollowerRepo {
    /// Record that `follower_id` follows `followed_id`.
    ///
    /// Returns `false` if the relation already existed.
    pub async fn follow(
        pool: &PgPool,
        follower_id: DbId,
        followed_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO followers (follower_id, followed_id) VALUES ($1, $2)
             ON CONFLICT (follower_id, followed_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a follow relation. Returns `true` if one was removed.
    pub async fn unfollow(
        pool: &PgPool,
        follower_id: DbId,
        followed_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM followers WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(
        pool: &PgPool,
        follower_id: DbId,
        followed_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(pool)
        .await
    }

    /// Accounts following `user_id`, most recent first.
    pub async fn followers(pool: &PgPool, user_id: DbId) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.name, u.profile_picture
             FROM followers f
             JOIN users u ON u.id = f.follower_id
             WHERE f.followed_id = $1
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Accounts `user_id` follows, most recent first.
    pub async fn following(pool: &PgPool, user_id: DbId) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.name, u.profile_picture
             FROM followers f
             JOIN users u ON u.id = f.followed_id
             WHERE f.follower_id = $1
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
