//! Project repository.

use crate::errors::PortalError;
use crate::models::{non_empty, CreateProjectRequest, Project, UpdateProjectRequest};
use crate::repositories::timed;
use sqlx::PgPool;

const PROJECT_COLUMNS: &str =
    "id, name, slug, description, url, icon_url, status, display_order, created_at, updated_at";

/// All projects, ordered for display.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, PortalError> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY display_order ASC, id ASC"
    );
    let projects = timed(
        "select",
        "projects",
        sqlx::query_as::<_, Project>(&query).fetch_all(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to list projects: {}", e)))?;

    Ok(projects)
}

/// Projects with status `active`, ordered for display.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Project>, PortalError> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE status = 'active' ORDER BY display_order ASC, id ASC"
    );
    let projects = timed(
        "select",
        "projects",
        sqlx::query_as::<_, Project>(&query).fetch_all(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to list active projects: {}", e)))?;

    Ok(projects)
}

pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Project>, PortalError> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
    let project = timed(
        "select",
        "projects",
        sqlx::query_as::<_, Project>(&query).bind(id).fetch_optional(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to fetch project by id: {}", e)))?;

    Ok(project)
}

pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>, PortalError> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1");
    let project = timed(
        "select",
        "projects",
        sqlx::query_as::<_, Project>(&query).bind(slug).fetch_optional(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to fetch project by slug: {}", e)))?;

    Ok(project)
}

/// Insert a project, returning its id.
pub async fn create(pool: &PgPool, req: &CreateProjectRequest) -> Result<i64, PortalError> {
    let (id,): (i64,) = timed(
        "insert",
        "projects",
        sqlx::query_as(
            r#"
            INSERT INTO projects (name, slug, description, url, icon_url, status, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.description)
        .bind(&req.url)
        .bind(non_empty(&req.icon_url))
        .bind(&req.status)
        .bind(req.display_order.unwrap_or(0))
        .fetch_one(pool),
    )
    .await
    .map_err(map_slug_conflict)?;

    Ok(id)
}

/// Apply a partial update.
///
/// Empty strings and absent fields leave the column untouched. Returns
/// `NotFound` when no row has the id.
pub async fn update(
    pool: &PgPool,
    id: i64,
    req: &UpdateProjectRequest,
) -> Result<(), PortalError> {
    let result = timed(
        "update",
        "projects",
        sqlx::query(
            r#"
            UPDATE projects SET
                name = COALESCE(NULLIF($1, ''), name),
                slug = COALESCE(NULLIF($2, ''), slug),
                description = COALESCE(NULLIF($3, ''), description),
                url = COALESCE(NULLIF($4, ''), url),
                icon_url = COALESCE(NULLIF($5, ''), icon_url),
                status = COALESCE(NULLIF($6, ''), status),
                display_order = COALESCE($7, display_order),
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(req.name.as_deref())
        .bind(req.slug.as_deref())
        .bind(req.description.as_deref())
        .bind(req.url.as_deref())
        .bind(req.icon_url.as_deref())
        .bind(req.status.as_deref())
        .bind(req.display_order)
        .bind(id)
        .execute(pool),
    )
    .await
    .map_err(map_slug_conflict)?;

    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound("Project not found".to_string()));
    }

    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), PortalError> {
    let result = timed(
        "delete",
        "projects",
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool),
    )
    .await
    .map_err(|e| PortalError::Database(format!("Failed to delete project: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound("Project not found".to_string()));
    }

    Ok(())
}

fn map_slug_conflict(e: sqlx::Error) -> PortalError {
    if e.to_string().contains("projects_slug_key") {
        PortalError::BadRequest("A project with this slug already exists".to_string())
    } else {
        PortalError::Database(format!("Failed to write project: {}", e))
    }
}
