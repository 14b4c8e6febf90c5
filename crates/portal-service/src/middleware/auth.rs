//! Access gate for the admin area.
//!
//! Extracts the Bearer token from the Authorization header, validates it
//! with the service signing key, and injects the caller's identity into
//! request extensions. Every rejection renders the same 401 body; the
//! specific reason only reaches debug logs and metrics.

use crate::config::AuthConfig;
use crate::crypto;
use crate::errors::PortalError;
use crate::observability::metrics::record_token_validation;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Identity attached to requests that pass the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
}

/// Validates bearer tokens against the configured signing key.
#[derive(Clone)]
pub struct AccessGate {
    auth: Arc<AuthConfig>,
}

impl AccessGate {
    pub fn new(auth: Arc<AuthConfig>) -> Self {
        Self { auth }
    }

    /// Decide whether a request carries a valid session.
    ///
    /// # Errors
    ///
    /// - `MissingHeader`: no Authorization header
    /// - `BadScheme`: anything other than `Bearer <token>`
    /// - `MalformedToken` / `BadSignature` / `Expired`: from token validation
    pub fn authorize(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, PortalError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(PortalError::MissingHeader)?;

        let value = value.to_str().map_err(|_| PortalError::BadScheme)?;
        let token = bearer_token(value).ok_or(PortalError::BadScheme)?;

        let claims = crypto::validate_token(token, &self.auth.signing_key)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// Exactly `Bearer`, one space, then a non-empty token without spaces.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Middleware guarding the admin routes.
///
/// Continues with `AuthenticatedUser` in request extensions, or
/// short-circuits with a uniform 401.
#[instrument(skip_all, name = "portal.middleware.auth")]
pub async fn require_admin(
    State(gate): State<Arc<AccessGate>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, PortalError> {
    let user = gate.authorize(req.headers()).map_err(|e| {
        tracing::debug!(
            target: "portal.middleware.auth",
            reason = e.reason(),
            "Request rejected by access gate"
        );
        record_token_validation("error", Some(e.reason()));
        e
    })?;

    record_token_validation("success", None);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
