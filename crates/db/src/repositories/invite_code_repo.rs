//! Repository for the `invite_codes` table.
//!
//! Redemption happens inside [`super::UserRepo::register_with_invite`] so the
//! code and the new account are written in one transaction.

use sqlx::PgPool;
use spartan_core::types::DbId;

use crate::models::invite_code::{CreateInviteCode, InviteCode};

/// Provides CRUD operations for invite codes.
pub struct InviteCodeRepo;

impl InviteCodeRepo {
    /// Insert a new code, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateInviteCode,
    ) -> Result<InviteCode, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            "INSERT INTO invite_codes (code, created_by, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, code, created_by, used_by, NULL::text AS used_by_username,
                       used_at, expires_at, created_at",
        )
        .bind(&input.code)
        .bind(input.created_by)
        .bind(input.expires_at)
        .fetch_one(pool)
        .await
    }

    /// Every code with the redeeming user's name, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<InviteCode>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            "SELECT i.id, i.code, i.created_by, i.used_by, u.username AS used_by_username,
                    i.used_at, i.expires_at, i.created_at
             FROM invite_codes i
             LEFT JOIN users u ON u.id = i.used_by
             ORDER BY i.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<InviteCode>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            "SELECT i.id, i.code, i.created_by, i.used_by, u.username AS used_by_username,
                    i.used_at, i.expires_at, i.created_at
             FROM invite_codes i
             LEFT JOIN users u ON u.id = i.used_by
             WHERE i.code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Delete a code. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
