//! Admin API. Every route here sits behind the access gate, so handlers can
//! rely on `AuthenticatedUser` being present in request extensions.

use crate::errors::PortalError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    ChangePasswordRequest, CreateProjectRequest, CreatedResponse, Portal, Project,
    UpdatePortalRequest, UpdateProjectRequest,
};
use crate::observability::metrics::{record_admin_operation, record_audit_log_failure};
use crate::repositories::{audit_logs, portal, projects};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /admin/me
pub async fn handle_me(Extension(user): Extension<AuthenticatedUser>) -> Json<AuthenticatedUser> {
    Json(user)
}

/// PUT /admin/account/password
pub async fn handle_change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, PortalError> {
    let result = user_service::change_password(
        &state.pool,
        &state.config.auth,
        user.user_id,
        payload.current_password.expose_secret(),
        payload.new_password.expose_secret(),
    )
    .await;
    track("change_password", &result);
    result?;

    audit(&state.pool, &user, "change_password", Some("users"), Some(user.user_id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/projects
///
/// All projects regardless of status.
pub async fn handle_list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, PortalError> {
    Ok(Json(projects::list_all(&state.pool).await?))
}

/// POST /admin/projects
pub async fn handle_create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), PortalError> {
    payload.validate()?;

    let result = projects::create(&state.pool, &payload).await;
    track("create_project", &result);
    let id = result?;

    audit(&state.pool, &user, "create_project", Some("projects"), Some(id)).await;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /admin/projects/:id
pub async fn handle_get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, PortalError> {
    projects::get_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))
}

/// PUT /admin/projects/:id
///
/// Partial update; returns the stored project afterwards.
pub async fn handle_update_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, PortalError> {
    payload.validate()?;

    let result = projects::update(&state.pool, id, &payload).await;
    track("update_project", &result);
    result?;

    audit(&state.pool, &user, "update_project", Some("projects"), Some(id)).await;

    projects::get_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))
}

/// DELETE /admin/projects/:id
pub async fn handle_delete_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    let result = projects::delete(&state.pool, id).await;
    track("delete_project", &result);
    result?;

    audit(&state.pool, &user, "delete_project", Some("projects"), Some(id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/portal
pub async fn handle_get_portal(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<Portal>>, PortalError> {
    Ok(Json(portal::get(&state.pool).await?))
}

/// PUT /admin/portal
///
/// Creates the profile on first call, merges afterwards.
pub async fn handle_update_portal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<UpdatePortalRequest>,
) -> Result<Json<Portal>, PortalError> {
    payload.validate()?;

    let result = portal::upsert(&state.pool, &payload).await;
    track("update_portal", &result);
    let updated = result?;

    audit(&state.pool, &user, "update_portal", Some("portal_config"), Some(updated.id)).await;
    Ok(Json(updated))
}

fn track<T>(operation: &str, result: &Result<T, PortalError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    record_admin_operation(operation, status);
}

/// Best-effort audit write; failures are logged and counted, never surfaced.
async fn audit(
    pool: &PgPool,
    user: &AuthenticatedUser,
    action: &str,
    resource: Option<&str>,
    resource_id: Option<i64>,
) {
    if let Err(e) =
        audit_logs::log_action(pool, Some(user.user_id), action, resource, resource_id, None).await
    {
        tracing::warn!(target: "portal.handlers.admin", action = action, error = %e, "Failed to write audit log");
        record_audit_log_failure(action);
    }
}
