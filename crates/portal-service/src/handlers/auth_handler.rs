use crate::errors::PortalError;
use crate::models::{LoginRequest, SessionResult};
use crate::routes::AppState;
use axum::{extract::State, Json};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Handle admin login
///
/// POST /api/v1/auth/login
///
/// Exchanges email + password for a session token.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResult>, PortalError> {
    let session = state
        .session_issuer
        .login(&payload.email, payload.password.expose_secret())
        .await?;

    Ok(Json(session))
}
