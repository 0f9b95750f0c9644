//! Handlers for the `/auth` resource (registration, login, sessions).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use spartan_core::error::CoreError;
use spartan_core::types::{DbId, Timestamp};
use spartan_db::models::session::{CreateSession, SessionInfo};
use spartan_db::models::user::{CreateUser, UserResponse};
use spartan_db::repositories::{InviteCodeRepo, SessionRepo, UserRepo};
use validator::Validate;

use super::{non_blank, validate_input};
use crate::auth::jwt::{generate_token, hash_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Lifetime of a session row, independent of the token's own expiry.
pub const SESSION_TTL_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_INVITE: &str = "Invalid or expired invite code";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    #[validate(length(min = 1, message = "Invite code is required"))]
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Expiry of the token (the session may outlive it).
    pub expires_at: Timestamp,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Request body for `POST /auth/revoke-session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionRequest {
    pub session_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub message: String,
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an account using a single-use invite code. The account insert and
/// the invite consumption commit together or not at all.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    validate_input(&input)?;
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();

    // Fail fast with a clear message; the transaction below re-checks.
    let invite = InviteCodeRepo::find_by_code(&state.pool, input.invite_code.trim()).await?;
    if !invite.is_some_and(|i| i.is_redeemable(Utc::now())) {
        return Err(AppError::BadRequest(INVALID_INVITE.into()));
    }

    if UserRepo::username_exists(&state.pool, &username).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Username already exists".into(),
        )));
    }
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict("Email already exists".into())));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create = CreateUser {
        username,
        email,
        password_hash,
        name: non_blank(input.name),
        phone_number: non_blank(input.phone_number),
        is_admin: false,
    };

    let user = UserRepo::register_with_invite(&state.pool, &create, input.invite_code.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_INVITE.into()))?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with username + password and open a new session.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let Some(user) = UserRepo::find_by_username(&state.pool, &input.username).await? else {
        // Spend one hash so an unknown username costs the same as a wrong password.
        let _ = hash_password(&input.password);
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let session_id = DbId::new_v4();
    let (token, expires_at) = generate_token(user.id, session_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let now = Utc::now();
    SessionRepo::create(
        &state.pool,
        &CreateSession {
            id: session_id,
            user_id: user.id,
            token_hash: hash_token(&token),
            device: client.user_agent,
            ip_address: client.ip,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, session_id = %session_id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: user.into(),
    }))
}

/// POST /api/auth/logout
///
/// End the session the request was authenticated with.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    SessionRepo::delete(&state.pool, auth.session_id).await?;
    tracing::info!(user_id = %auth.user_id, session_id = %auth.session_id, "User logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<SessionInfo>>> {
    let sessions = SessionRepo::list_active_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionInfo::from_session(s, auth.session_id))
            .collect(),
    ))
}

/// POST /api/auth/revoke-session
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<RevokeSessionRequest>,
) -> AppResult<Json<MessageResponse>> {
    let removed =
        SessionRepo::delete_for_user(&state.pool, input.session_id, auth.user_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Session",
            id: input.session_id,
        }));
    }
    Ok(Json(MessageResponse::new("Session revoked successfully")))
}

/// POST /api/auth/revoke-all-sessions
///
/// Revoke every session of the caller except the current one.
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<RevokeAllResponse>> {
    let revoked =
        SessionRepo::delete_all_except(&state.pool, auth.user_id, auth.session_id).await?;
    tracing::info!(user_id = %auth.user_id, revoked, "Revoked other sessions");
    Ok(Json(RevokeAllResponse {
        message: "All other sessions revoked successfully".into(),
        revoked,
    }))
}

/// POST /api/auth/refresh-token
///
/// Issue a fresh token for the current session without re-entering credentials.
pub async fn refresh_token(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<TokenResponse>> {
    let (token, expires_at) = generate_token(auth.user_id, auth.session_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    if !SessionRepo::rotate_token(&state.pool, auth.session_id, &hash_token(&token)).await? {
        return Err(AppError::unauthorized("Session expired or revoked"));
    }

    Ok(Json(TokenResponse { token, expires_at }))
}
