//! Audit trail of admin actions.

use crate::errors::PortalError;
use crate::repositories::timed;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Audit log entry (maps to audit_logs table)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<i64>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append an entry to the audit trail.
pub async fn log_action(
    pool: &PgPool,
    user_id: Option<i64>,
    action: &str,
    resource: Option<&str>,
    resource_id: Option<i64>,
    details: Option<&str>,
) -> Result<AuditLog, PortalError> {
    let entry = timed(
        "insert",
        "audit_logs",
        sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, resource, resource_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, action, resource, resource_id, details, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(resource)
        .bind(resource_id)
        .bind(details)
        .fetch_one(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to write audit log: {}", e)))?;

    Ok(entry)
}
