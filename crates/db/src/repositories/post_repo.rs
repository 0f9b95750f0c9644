//! Repository for the `posts` table.

use std::collections::HashMap;

use sqlx::PgPool;
use spartan_core::types::DbId;

use super::CommentRepo;
use crate::models::post::{CreatePost, Post, PostWithAuthor};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, caption, media_url, media_type, thumbnail_url, \
                        likes, created_at, updated_at";

/// Select list for [`PostWithAuthor`]; `$1` is the viewer (may be NULL).
const WITH_AUTHOR: &str = "SELECT p.id, p.user_id, u.username, p.caption, p.media_url,
                                  p.media_type, p.thumbnail_url, p.likes,
                                  EXISTS(SELECT 1 FROM post_likes pl
                                         WHERE pl.post_id = p.id AND pl.user_id = $1) AS liked,
                                  p.created_at, p.updated_at
                           FROM posts p
                           JOIN users u ON u.id = p.user_id";

/// Provides CRUD operations for posts.
pub struct PostRepo;

impl PostRepo {
    /// Insert a new post, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreatePost) -> Result<Post, sqlx::Error> {
        let query = format!(
            "INSERT INTO posts (user_id, caption, media_url, media_type, thumbnail_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(input.user_id)
            .bind(&input.caption)
            .bind(&input.media_url)
            .bind(&input.media_type)
            .bind(&input.thumbnail_url)
            .fetch_one(pool)
            .await
    }

    /// Find a post by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a post exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// One post with author, viewer like state and comments.
    pub async fn find_with_author(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<PostWithAuthor>, sqlx::Error> {
        let query = format!("{WITH_AUTHOR} WHERE p.id = $2");
        let post = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match post {
            Some(post) => {
                let mut posts = vec![post];
                Self::attach_comments(pool, &mut posts).await?;
                Ok(posts.pop())
            }
            None => Ok(None),
        }
    }

    /// Newest posts across all users.
    pub async fn list_recent(
        pool: &PgPool,
        viewer: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
        let query = format!("{WITH_AUTHOR} ORDER BY p.created_at DESC LIMIT $2 OFFSET $3");
        let mut posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Self::attach_comments(pool, &mut posts).await?;
        Ok(posts)
    }

    /// Posts by one author, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
        viewer: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
        let query = format!(
            "{WITH_AUTHOR} WHERE p.user_id = $2 ORDER BY p.created_at DESC LIMIT $3 OFFSET $4"
        );
        let mut posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Self::attach_comments(pool, &mut posts).await?;
        Ok(posts)
    }

    /// Posts by the accounts `viewer` follows, newest first.
    pub async fn feed(
        pool: &PgPool,
        viewer: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
        let query = format!(
            "{WITH_AUTHOR}
             WHERE p.user_id IN (SELECT followed_id FROM followers WHERE follower_id = $1)
             ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"
        );
        let mut posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Self::attach_comments(pool, &mut posts).await?;
        Ok(posts)
    }

    /// Change the caption of a post owned by `owner`.
    ///
    /// Returns `None` if the post does not exist or belongs to someone else.
    pub async fn update_caption(
        pool: &PgPool,
        id: DbId,
        owner: DbId,
        caption: &str,
    ) -> Result<Option<Post>, sqlx::Error> {
        let query = format!(
            "UPDATE posts SET caption = $3, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(owner)
            .bind(caption)
            .fetch_optional(pool)
            .await
    }

    /// Delete a post with its comments and likes in one transaction.
    ///
    /// With `owner` set, only a post belonging to that user is deleted. Returns
    /// the deleted row so the caller can remove its stored media, or `None` if
    /// nothing matched.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Post>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM posts
             WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)
             FOR UPDATE"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(post) = post else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(post))
    }

    /// Fill in `comments` for each post, oldest comment first.
    async fn attach_comments(
        pool: &PgPool,
        posts: &mut [PostWithAuthor],
    ) -> Result<(), sqlx::Error> {
        if posts.is_empty() {
            return Ok(());
        }
        let ids: Vec<DbId> = posts.iter().map(|p| p.id).collect();
        let mut by_post: HashMap<DbId, Vec<_>> = HashMap::new();
        for comment in CommentRepo::list_for_posts(pool, &ids).await? {
            by_post.entry(comment.post_id).or_default().push(comment);
        }
        for post in posts.iter_mut() {
            post.comments = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }
}
