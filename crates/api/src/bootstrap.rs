//! First-run administrator provisioning.

use rand::distr::Alphanumeric;
use rand::Rng;
use spartan_db::models::user::{CreateUser, User};
use spartan_db::repositories::UserRepo;
use spartan_db::DbPool;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};

const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@spartannet.com";
const ADMIN_PASSWORD_LEN: usize = 16;
const USERNAME_SUFFIX_LEN: usize = 6;

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Create an administrator when none exists.
///
/// The generated password is logged once at `warn` level and never stored in
/// clear. Returns the created user, or `None` if an administrator was already
/// present.
pub async fn bootstrap_admin(pool: &DbPool) -> AppResult<Option<User>> {
    if UserRepo::admin_exists(pool).await? {
        tracing::debug!("Administrator account present");
        return Ok(None);
    }

    let username = if UserRepo::username_exists(pool, ADMIN_USERNAME).await? {
        format!("{ADMIN_USERNAME}_{}", random_alphanumeric(USERNAME_SUFFIX_LEN))
    } else {
        ADMIN_USERNAME.to_string()
    };
    let password = random_alphanumeric(ADMIN_PASSWORD_LEN);
    let password_hash = hash_password(&password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username,
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            name: Some("Administrator".to_string()),
            phone_number: None,
            is_admin: true,
        },
    )
    .await?;

    tracing::warn!(
        username = %user.username,
        password = %password,
        "Created initial administrator account; change this password after first login",
    );
    Ok(Some(user))
}
