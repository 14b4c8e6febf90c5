use crate::errors::PortalError;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Minimum length for project and portal names.
pub const MIN_NAME_LENGTH: usize = 3;

/// Minimum length for a new account password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// Authentication
// ============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Successful login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub token: String,
    pub expires_in_seconds: i64,
    pub subject: SubjectSummary,
}

/// Public view of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Own-password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

// ============================================================================
// Projects
// ============================================================================

/// Project model (maps to projects table)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub url: String,
    pub icon_url: Option<String>,
    pub status: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Inactive,
    Maintenance,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
            ProjectStatus::Maintenance => "maintenance",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "inactive" => Ok(ProjectStatus::Inactive),
            "maintenance" => Ok(ProjectStatus::Maintenance),
            _ => Err(format!("Invalid project status: {}", s)),
        }
    }
}

/// Create project request body
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    pub status: String,
    #[serde(default, rename = "order")]
    pub display_order: Option<i32>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), PortalError> {
        validate_name(&self.name)?;
        validate_slug(&self.slug)?;
        if self.description.trim().is_empty() {
            return Err(PortalError::BadRequest(
                "description is required".to_string(),
            ));
        }
        validate_url("url", &self.url)?;
        if let Some(icon_url) = non_empty(&self.icon_url) {
            validate_url("icon_url", icon_url)?;
        }
        validate_status(&self.status)?;
        Ok(())
    }
}

/// Partial project update; absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "order")]
    pub display_order: Option<i32>,
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> Result<(), PortalError> {
        if let Some(name) = non_empty(&self.name) {
            validate_name(name)?;
        }
        if let Some(slug) = non_empty(&self.slug) {
            validate_slug(slug)?;
        }
        if let Some(url) = non_empty(&self.url) {
            validate_url("url", url)?;
        }
        if let Some(icon_url) = non_empty(&self.icon_url) {
            validate_url("icon_url", icon_url)?;
        }
        if let Some(status) = non_empty(&self.status) {
            validate_status(status)?;
        }
        Ok(())
    }
}

/// Public project listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    pub data: Vec<Project>,
    pub total: usize,
}

/// Identifier of a newly created row
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

// ============================================================================
// Portal profile
// ============================================================================

/// Organization profile (maps to portal_config table)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Portal {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Portal profile upsert; absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePortalRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl UpdatePortalRequest {
    pub fn validate(&self) -> Result<(), PortalError> {
        if let Some(name) = non_empty(&self.name) {
            validate_name(name)?;
        }
        if let Some(logo_url) = non_empty(&self.logo_url) {
            validate_url("logo_url", logo_url)?;
        }
        if let Some(website) = non_empty(&self.website) {
            validate_url("website", website)?;
        }
        if let Some(email) = non_empty(&self.email) {
            validate_email(email)?;
        }
        if let Some(phone) = non_empty(&self.phone) {
            if phone.chars().count() > 20 {
                return Err(PortalError::BadRequest(
                    "phone must be at most 20 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Health
// ============================================================================

/// `/api/v1/health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: i64,
}

// ============================================================================
// Field validation
// ============================================================================

/// Treat `Some("")` the same as `None`.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn validate_name(name: &str) -> Result<(), PortalError> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        return Err(PortalError::BadRequest(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Slugs are lowercase ASCII letters, digits and single hyphens.
fn validate_slug(slug: &str) -> Result<(), PortalError> {
    let well_formed = slug.len() >= MIN_NAME_LENGTH
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if !well_formed {
        return Err(PortalError::BadRequest(
            "slug must be at least 3 characters of a-z, 0-9 and single hyphens".to_string(),
        ));
    }
    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), PortalError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => Ok(()),
        _ => Err(PortalError::BadRequest(format!(
            "{field} must be an absolute http(s) URL"
        ))),
    }
}

fn validate_status(status: &str) -> Result<(), PortalError> {
    ProjectStatus::from_str(status)
        .map(|_| ())
        .map_err(|_| {
            PortalError::BadRequest(
                "status must be one of: active, inactive, maintenance".to_string(),
            )
        })
}

fn validate_email(email: &str) -> Result<(), PortalError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    };

    if !valid {
        return Err(PortalError::BadRequest(
            "email must be a valid address".to_string(),
        ));
    }
    Ok(())
}
