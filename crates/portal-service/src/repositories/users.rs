//! User repository module for database operations.
//!
//! Provides the credential lookup used by login (behind the
//! [`CredentialStore`] trait so the session issuer can be driven without a
//! database) plus account creation and password updates.

use crate::errors::PortalError;
use crate::repositories::timed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;

/// Default role for accounts created through this service.
pub const DEFAULT_ROLE: &str = "admin";

const USER_COLUMNS: &str = "id, email, name, password AS password_hash, role, is_active, created_at, updated_at";

/// Credential record (maps to users table).
///
/// Not `Serialize`: the hash never leaves the service.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Credential lookup used by the session issuer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an active account by exact email.
    ///
    /// Returns `Ok(None)` for unknown and for inactive accounts alike.
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, PortalError>;
}

/// Postgres-backed [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, PortalError> {
        find_active_by_email(&self.pool, email).await
    }
}

/// Get an active user by email.
pub async fn find_active_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, PortalError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = true");
    let user = timed(
        "select",
        "users",
        sqlx::query_as::<_, User>(&query).bind(email).fetch_optional(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to fetch user by email: {}", e)))?;

    Ok(user)
}

/// Get user by id, active or not.
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, PortalError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = timed(
        "select",
        "users",
        sqlx::query_as::<_, User>(&query).bind(id).fetch_optional(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to fetch user by id: {}", e)))?;

    Ok(user)
}

/// Create a new active user.
///
/// Returns the created user record.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    role: &str,
) -> Result<User, PortalError> {
    let query = format!(
        "INSERT INTO users (email, name, password, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
    );
    let user = timed(
        "insert",
        "users",
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(role)
            .fetch_one(pool),
    )
    .await
    .map_err(|e| {
        if e.to_string().contains("users_email_key") {
            PortalError::BadRequest("User with this email already exists".to_string())
        } else {
            PortalError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(user)
}

/// Replace a user's password hash.
pub async fn update_password(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), PortalError> {
    let result = timed(
        "update",
        "users",
        sqlx::query(
            r#"
            UPDATE users
            SET password = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to update password: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound("User not found".to_string()));
    }

    Ok(())
}

/// Count all users, active or not.
pub async fn count_users(pool: &PgPool) -> Result<i64, PortalError> {
    let (count,): (i64,) = timed(
        "select",
        "users",
        sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to count users: {}", e)))?;

    Ok(count)
}
