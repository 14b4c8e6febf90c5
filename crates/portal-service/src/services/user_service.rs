//! Account management: creation, own-password change, first-admin bootstrap.

use crate::config::{AuthConfig, BootstrapAdmin};
use crate::crypto;
use crate::errors::PortalError;
use crate::models::MIN_PASSWORD_LENGTH;
use crate::observability::hash_for_correlation;
use crate::repositories::users::{self, User, DEFAULT_ROLE};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::instrument;

/// Create a new active account.
///
/// # Errors
///
/// - `BadRequest` for a malformed email, short or over-long password, empty
///   name, or an email that is already taken
/// - `Internal` if hashing fails
#[instrument(skip_all, fields(email_hash = %hash_for_correlation(email)))]
pub async fn create_user(
    pool: &PgPool,
    auth: &AuthConfig,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<User, PortalError> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(PortalError::BadRequest("Invalid email format".to_string()));
    }
    validate_new_password(password)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(PortalError::BadRequest("Name cannot be empty".to_string()));
    }

    let password_hash = crypto::hash_password(password, auth.bcrypt_cost)?;
    let user = users::create_user(pool, email, name, &password_hash, role).await?;

    tracing::info!(target: "portal.services.user", user_id = user.id, "User created");
    Ok(user)
}

/// Change the password of the calling account.
///
/// The current password must verify before the new one is stored.
#[instrument(skip_all, fields(user_id = user_id))]
pub async fn change_password(
    pool: &PgPool,
    auth: &AuthConfig,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), PortalError> {
    let user = users::get_by_id(pool, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| PortalError::NotFound("User not found".to_string()))?;

    if !crypto::verify_password(current_password, &user.password_hash) {
        return Err(PortalError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    validate_new_password(new_password)?;
    if current_password == new_password {
        return Err(PortalError::BadRequest(
            "New password must differ from the current one".to_string(),
        ));
    }

    let password_hash = crypto::hash_password(new_password, auth.bcrypt_cost)?;
    users::update_password(pool, user.id, &password_hash).await?;

    // Sessions already issued stay valid until they expire.
    tracing::info!(target: "portal.services.user", user_id = user.id, "Password changed");
    Ok(())
}

/// Seed the first admin account when the users table is empty.
///
/// Returns `true` when an account was created.
pub async fn ensure_bootstrap_admin(
    pool: &PgPool,
    auth: &AuthConfig,
    bootstrap: &BootstrapAdmin,
) -> Result<bool, PortalError> {
    if users::count_users(pool).await? > 0 {
        tracing::debug!(target: "portal.services.user", "Users exist, skipping admin bootstrap");
        return Ok(false);
    }

    create_user(
        pool,
        auth,
        &bootstrap.email,
        &bootstrap.name,
        bootstrap.password.expose_secret(),
        DEFAULT_ROLE,
    )
    .await?;

    tracing::info!(target: "portal.services.user", "Bootstrap admin account created");
    Ok(true)
}

fn validate_new_password(password: &str) -> Result<(), PortalError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PortalError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > crypto::MAX_PASSWORD_BYTES {
        return Err(PortalError::BadRequest(format!(
            "Password must be at most {} bytes",
            crypto::MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

/// Basic email shape check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
