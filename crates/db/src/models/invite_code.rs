//! Invite code model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use spartan_core::types::{DbId, Timestamp};

/// An invite code row joined with the username of whoever redeemed it.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: DbId,
    pub code: String,
    pub created_by: Option<DbId>,
    pub used_by: Option<DbId>,
    pub used_by_username: Option<String>,
    pub used_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl InviteCode {
    /// Whether the code can still complete a registration at `now`.
    pub fn is_redeemable(&self, now: Timestamp) -> bool {
        spartan_core::invite::is_redeemable(self.used_at.is_some(), self.expires_at, now)
    }
}

/// DTO for creating an invite code.
#[derive(Debug, Clone)]
pub struct CreateInviteCode {
    pub code: String,
    pub created_by: DbId,
    pub expires_at: Option<Timestamp>,
}
