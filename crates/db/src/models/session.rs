//! Session model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use spartan_core::types::{DbId, Timestamp};

/// A session row from the `sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    /// SHA-256 hex digest of the most recently issued bearer token.
    pub token_hash: String,
    pub device: Option<String>,
    pub ip_address: Option<String>,
    pub last_active: Timestamp,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for creating a new session. The id is chosen by the caller because the
/// bearer token embeds it and is minted before the row is written.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub device: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// A session as listed to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: DbId,
    pub device: Option<String>,
    pub ip_address: Option<String>,
    pub last_active: Timestamp,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    /// True for the session that made the listing request.
    pub is_current: bool,
}

impl SessionInfo {
    pub fn from_session(session: Session, current: DbId) -> Self {
        Self {
            is_current: session.id == current,
            id: session.id,
            device: session.device,
            ip_address: session.ip_address,
            last_active: session.last_active,
            expires_at: session.expires_at,
            created_at: session.created_at,
        }
    }
}
