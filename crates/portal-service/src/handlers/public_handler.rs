//! Public, read-only content API.

use crate::errors::PortalError;
use crate::models::{Portal, Project, ProjectList};
use crate::repositories::{portal, projects};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// GET /api/v1/portal
///
/// Returns `null` until the profile has been configured.
pub async fn get_portal(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<Portal>>, PortalError> {
    Ok(Json(portal::get(&state.pool).await?))
}

/// GET /api/v1/projects
///
/// Active projects only.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProjectList>, PortalError> {
    let data = projects::list_active(&state.pool).await?;
    let total = data.len();

    Ok(Json(ProjectList { data, total }))
}

/// GET /api/v1/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, PortalError> {
    projects::get_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))
}

/// GET /api/v1/projects/slug/:slug
pub async fn get_project_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, PortalError> {
    projects::get_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))
}
