//! Portal profile repository. The `portal_config` table holds at most one row.

use crate::errors::PortalError;
use crate::models::{non_empty, Portal, UpdatePortalRequest};
use crate::observability::metrics::record_db_query;
use crate::repositories::timed;
use sqlx::PgPool;
use std::time::Instant;

const PORTAL_COLUMNS: &str =
    "id, name, description, logo_url, website, email, phone, address, created_at, updated_at";

/// The portal profile, if one has been configured.
pub async fn get(pool: &PgPool) -> Result<Option<Portal>, PortalError> {
    let query = format!("SELECT {PORTAL_COLUMNS} FROM portal_config ORDER BY id ASC LIMIT 1");
    let portal = timed(
        "select",
        "portal_config",
        sqlx::query_as::<_, Portal>(&query).fetch_optional(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to fetch portal profile: {}", e)))?;

    Ok(portal)
}

/// Create the profile or merge into the existing one.
///
/// On update, empty and absent fields keep their stored value. Creating the
/// profile requires a name. Runs in one transaction so concurrent upserts
/// cannot both insert.
pub async fn upsert(pool: &PgPool, req: &UpdatePortalRequest) -> Result<Portal, PortalError> {
    let start = Instant::now();
    let result = upsert_in_transaction(pool, req).await;

    let status = if result.is_ok() { "success" } else { "error" };
    record_db_query("upsert", "portal_config", status, start.elapsed());

    result
}

async fn upsert_in_transaction(
    pool: &PgPool,
    req: &UpdatePortalRequest,
) -> Result<Portal, PortalError> {
    let mut tx = pool.begin().await?;

    // Serialize upserts; the row itself may not exist yet.
    sqlx::query("LOCK TABLE portal_config IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM portal_config ORDER BY id ASC LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;

    let portal = match existing {
        Some((id,)) => {
            sqlx::query_as::<_, Portal>(&format!(
                r#"
                UPDATE portal_config SET
                    name = COALESCE(NULLIF($1, ''), name),
                    description = COALESCE(NULLIF($2, ''), description),
                    logo_url = COALESCE(NULLIF($3, ''), logo_url),
                    website = COALESCE(NULLIF($4, ''), website),
                    email = COALESCE(NULLIF($5, ''), email),
                    phone = COALESCE(NULLIF($6, ''), phone),
                    address = COALESCE(NULLIF($7, ''), address),
                    updated_at = NOW()
                WHERE id = $8
                RETURNING {PORTAL_COLUMNS}
                "#
            ))
            .bind(req.name.as_deref())
            .bind(req.description.as_deref())
            .bind(req.logo_url.as_deref())
            .bind(req.website.as_deref())
            .bind(req.email.as_deref())
            .bind(req.phone.as_deref())
            .bind(req.address.as_deref())
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        }
        None => {
            let name = non_empty(&req.name).ok_or_else(|| {
                PortalError::BadRequest(
                    "name is required when creating the portal profile".to_string(),
                )
            })?;

            sqlx::query_as::<_, Portal>(&format!(
                r#"
                INSERT INTO portal_config (name, description, logo_url, website, email, phone, address)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {PORTAL_COLUMNS}
                "#
            ))
            .bind(name)
            .bind(non_empty(&req.description))
            .bind(non_empty(&req.logo_url))
            .bind(non_empty(&req.website))
            .bind(non_empty(&req.email))
            .bind(non_empty(&req.phone))
            .bind(non_empty(&req.address))
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;

    Ok(portal)
}
