//! Repository for the `users` table.

use sqlx::{PgPool, Postgres, Transaction};
use spartan_core::types::DbId;

use crate::models::user::{AdminUserRow, CreateUser, UpdateProfile, User, UserProfile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, name, phone_number, \
                        profile_picture, is_admin, created_at, updated_at";

/// Media owned by a deleted account, for best-effort object cleanup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrphanedMedia {
    pub media_url: String,
    pub thumbnail_url: Option<String>,
}

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, name, phone_number, is_admin)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.name)
            .bind(&input.phone_number)
            .bind(input.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Create a user and consume an invite code in one transaction.
    ///
    /// Returns `None` (and creates nothing) when the code does not exist, was
    /// already used or has expired. The invite row is claimed first, so two
    /// concurrent registrations cannot both redeem it.
    pub async fn register_with_invite(
        pool: &PgPool,
        input: &CreateUser,
        invite_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let invite_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE invite_codes SET used_at = NOW()
             WHERE code = $1
               AND used_at IS NULL
               AND used_by IS NULL
               AND (expires_at IS NULL OR expires_at > NOW())
             RETURNING id",
        )
        .bind(invite_code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invite_id) = invite_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO users (username, email, password_hash, name, phone_number, is_admin)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.name)
            .bind(&input.phone_number)
            .bind(input.is_admin)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE invite_codes SET used_by = $2 WHERE id = $1")
            .bind(invite_id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user))
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Whether a user with this username exists.
    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Whether at least one administrator account exists.
    pub async fn admin_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_admin)")
            .fetch_one(pool)
            .await
    }

    /// Whether the given user is an administrator. Unknown users are not.
    pub async fn is_admin(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let is_admin: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(is_admin.unwrap_or(false))
    }

    /// Replace the editable profile fields.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = $2,
                email = $3,
                phone_number = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone_number)
            .fetch_optional(pool)
            .await
    }

    /// Store a new password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an account and everything that cascades from it.
    ///
    /// Returns the media the account's posts referenced so the caller can
    /// remove the stored objects, or `None` if the user did not exist.
    pub async fn delete_account(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Vec<OrphanedMedia>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let media = Self::delete_account_inner(&mut tx, id).await?;
        tx.commit().await?;
        Ok(media)
    }

    /// Administrative deletion: like [`Self::delete_account`], but the invite
    /// code the account registered with becomes redeemable again.
    pub async fn delete_account_releasing_invite(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Vec<OrphanedMedia>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE invite_codes SET used_by = NULL, used_at = NULL WHERE used_by = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let media = Self::delete_account_inner(&mut tx, id).await?;
        tx.commit().await?;
        Ok(media)
    }

    async fn delete_account_inner(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Vec<OrphanedMedia>>, sqlx::Error> {
        let media = sqlx::query_as::<_, OrphanedMedia>(
            "SELECT media_url, thumbnail_url FROM posts WHERE user_id = $1",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;

        // Likes on other users' posts disappear with the account; keep their
        // counters in step.
        sqlx::query(
            "UPDATE posts SET likes = GREATEST(likes - 1, 0)
             WHERE id IN (SELECT post_id FROM post_likes WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(media))
    }

    /// Public profile of `id` with counts, from the perspective of `viewer`.
    pub async fn profile(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT u.id, u.username, u.name, u.profile_picture, u.created_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS post_count,
                    (SELECT COUNT(*) FROM followers f WHERE f.followed_id = u.id) AS follower_count,
                    (SELECT COUNT(*) FROM followers f WHERE f.follower_id = u.id) AS following_count,
                    EXISTS(SELECT 1 FROM followers f
                           WHERE f.follower_id = $2 AND f.followed_id = u.id) AS is_following
             FROM users u
             WHERE u.id = $1",
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(pool)
        .await
    }

    /// Case-insensitive substring search over username and name.
    pub async fn search(
        pool: &PgPool,
        term: &str,
        viewer: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<UserProfile>, sqlx::Error> {
        let pattern = format!("%{}%", escape_like(term));
        sqlx::query_as::<_, UserProfile>(
            "SELECT u.id, u.username, u.name, u.profile_picture, u.created_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS post_count,
                    (SELECT COUNT(*) FROM followers f WHERE f.followed_id = u.id) AS follower_count,
                    (SELECT COUNT(*) FROM followers f WHERE f.follower_id = u.id) AS following_count,
                    EXISTS(SELECT 1 FROM followers f
                           WHERE f.follower_id = $2 AND f.followed_id = u.id) AS is_following
             FROM users u
             WHERE u.username ILIKE $1 OR u.name ILIKE $1
             ORDER BY u.username
             LIMIT $3",
        )
        .bind(pattern)
        .bind(viewer)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// All users with activity statistics, newest first.
    pub async fn list_for_admin(pool: &PgPool) -> Result<Vec<AdminUserRow>, sqlx::Error> {
        sqlx::query_as::<_, AdminUserRow>(
            "SELECT u.id, u.username, u.email, u.name, u.is_admin, u.created_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS post_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id) AS comment_count,
                    (SELECT MAX(s.last_active) FROM sessions s WHERE s.user_id = u.id) AS last_login
             FROM users u
             ORDER BY u.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
