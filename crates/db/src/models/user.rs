//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use spartan_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The account owner's view of their own user record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            phone_number: user.phone_number,
            profile_picture: user.profile_picture,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub is_admin: bool,
}

/// Complete replacement values for the editable profile fields.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Public identity shown in follower lists.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: DbId,
    pub username: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Public profile with social counts.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: DbId,
    pub username: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: Timestamp,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    /// Whether the requesting user follows this profile; false when anonymous.
    pub is_following: bool,
}

/// Row in the admin user listing.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub post_count: i64,
    pub comment_count: i64,
    /// Most recent activity across the user's sessions.
    pub last_login: Option<Timestamp>,
}
