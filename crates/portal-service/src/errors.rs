//! Portal error taxonomy.
//!
//! Every entry point returns `PortalError` and the `IntoResponse` impl below
//! is the only place the taxonomy is mapped to HTTP. Messages returned to
//! clients are fixed strings; internal detail is logged server-side only.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Client-visible message for every access-gate rejection.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";

/// Client-visible message for a failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header format")]
    BadScheme,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issuance failed: {0}")]
    TokenIssuanceFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl PortalError {
    /// True for the failures the access gate turns into a uniform 401.
    pub fn is_gate_rejection(&self) -> bool {
        matches!(
            self,
            PortalError::MissingHeader
                | PortalError::BadScheme
                | PortalError::MalformedToken
                | PortalError::BadSignature
                | PortalError::Expired
        )
    }

    /// Bounded label for metrics and debug logs.
    pub fn reason(&self) -> &'static str {
        match self {
            PortalError::InvalidCredentials => "invalid_credentials",
            PortalError::MissingHeader => "missing_header",
            PortalError::BadScheme => "bad_scheme",
            PortalError::MalformedToken => "malformed_token",
            PortalError::BadSignature => "bad_signature",
            PortalError::Expired => "expired",
            PortalError::TokenIssuanceFailed(_) => "token_issuance_failed",
            PortalError::Database(_) => "database",
            PortalError::NotFound(_) => "not_found",
            PortalError::BadRequest(_) => "bad_request",
            PortalError::Internal => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::InvalidCredentials
            | PortalError::MissingHeader
            | PortalError::BadScheme
            | PortalError::MalformedToken
            | PortalError::BadSignature
            | PortalError::Expired => StatusCode::UNAUTHORIZED,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::TokenIssuanceFailed(_)
            | PortalError::Database(_)
            | PortalError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            PortalError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            PortalError::MissingHeader
            | PortalError::BadScheme
            | PortalError::MalformedToken
            | PortalError::BadSignature
            | PortalError::Expired => ("UNAUTHORIZED", UNAUTHORIZED_MESSAGE.to_string()),
            PortalError::TokenIssuanceFailed(detail) => {
                tracing::error!(target: "portal.errors", error = %detail, "Token issuance failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
            PortalError::Database(detail) => {
                tracing::error!(target: "portal.errors", error = %detail, "Database operation failed");
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            PortalError::NotFound(what) => ("NOT_FOUND", what.clone()),
            PortalError::BadRequest(reason) => ("BAD_REQUEST", reason.clone()),
            PortalError::Internal => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if self.is_gate_rejection() {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"portal-admin\""),
            );
        }

        response
    }
}

impl From<sqlx::Error> for PortalError {
    fn from(err: sqlx::Error) -> Self {
        PortalError::Database(err.to_string())
    }
}
