//! Portal service configuration.
//!
//! Configuration is loaded once from environment variables at startup and
//! never mutated afterwards. The token-related part is split out into
//! [`AuthConfig`] so it can be shared read-only (via `Arc`) with the session
//! issuer and the access gate.

use secrecy::{ExposeSecret, SecretBox, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default token time-to-live (24 hours).
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 86_400;

/// Default bcrypt cost factor (2^12 iterations).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum accepted bcrypt cost. Anything lower is too cheap to brute force.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum accepted bcrypt cost. Anything higher makes logins crawl.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Origin value that allows any cross-origin caller.
pub const CORS_ANY_ORIGIN: &str = "*";

/// Server-held HMAC key used to sign and verify session tokens.
///
/// Wrapped in `SecretBox` so it never shows up in `Debug` output or logs.
pub struct SigningKey(SecretBox<Vec<u8>>);

impl SigningKey {
    /// Build a signing key from raw bytes.
    ///
    /// Returns `ConfigError::EmptySigningKey` for an empty key.
    pub fn new(bytes: Vec<u8>) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::EmptySigningKey);
        }
        Ok(Self(SecretBox::new(Box::new(bytes))))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self(SecretBox::new(Box::new(self.0.expose_secret().clone())))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey([REDACTED])")
    }
}

/// Token settings shared by the session issuer and the access gate.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_key: SigningKey,
    pub token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Validate and build the auth configuration.
    pub fn new(
        signing_key: SigningKey,
        token_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Result<Self, ConfigError> {
        if token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTokenTtl(format!(
                "token TTL must be positive, got {}",
                token_ttl_seconds
            )));
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(format!(
                "BCRYPT_COST must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, bcrypt_cost
            )));
        }

        Ok(Self {
            signing_key,
            token_ttl_seconds,
            bcrypt_cost,
        })
    }
}

/// Credentials for the first admin account, created at startup when the
/// users table is empty.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: SecretString,
    pub name: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// Portal service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum number of pooled database connections.
    pub db_max_connections: u32,

    /// Token signing and password hashing settings.
    pub auth: Arc<AuthConfig>,

    /// Optional first admin account.
    pub bootstrap_admin: Option<BootstrapAdmin>,

    /// Origins allowed to call the API from a browser. Empty allows none;
    /// `"*"` allows any.
    pub cors_allowed_origins: Vec<String>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("db_max_connections", &self.db_max_connections)
            .field("auth", &self.auth)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("JWT_SECRET must not be empty")]
    EmptySigningKey,

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid bcrypt cost configuration: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid database pool configuration: {0}")]
    InvalidPoolSize(String),

    #[error("Incomplete bootstrap admin configuration: {0}")]
    IncompleteBootstrapAdmin(String),

    #[error("Invalid CORS configuration: {0}")]
    InvalidCorsOrigin(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let secret = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;
        let signing_key = SigningKey::new(secret.as_bytes().to_vec())?;

        // JWT_EXPIRY is the older name; JWT_EXPIRY_SECONDS wins when both are set.
        let (ttl_var, ttl_value) = match vars.get("JWT_EXPIRY_SECONDS") {
            Some(value) => ("JWT_EXPIRY_SECONDS", Some(value)),
            None => ("JWT_EXPIRY", vars.get("JWT_EXPIRY")),
        };
        let token_ttl_seconds = match ttl_value {
            Some(value_str) => value_str.trim().parse::<i64>().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "{} must be a valid integer, got '{}': {}",
                    ttl_var, value_str, e
                ))
            })?,
            None => DEFAULT_TOKEN_TTL_SECONDS,
        };

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(value_str) => value_str.trim().parse::<u32>().map_err(|e| {
                ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => DEFAULT_BCRYPT_COST,
        };

        let db_max_connections = match vars.get("DB_MAX_CONNECTIONS") {
            Some(value_str) => {
                let value = value_str.trim().parse::<u32>().map_err(|e| {
                    ConfigError::InvalidPoolSize(format!(
                        "DB_MAX_CONNECTIONS must be a valid integer, got '{}': {}",
                        value_str, e
                    ))
                })?;
                if value == 0 {
                    return Err(ConfigError::InvalidPoolSize(
                        "DB_MAX_CONNECTIONS must be positive".to_string(),
                    ));
                }
                value
            }
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let auth = AuthConfig::new(signing_key, token_ttl_seconds, bcrypt_cost)?;
        let bootstrap_admin = bootstrap_admin_from_vars(vars)?;
        let cors_allowed_origins = match vars.get("CORS_ALLOWED_ORIGINS") {
            Some(value) => parse_cors_origins(value)?,
            None => Vec::new(),
        };

        Ok(Config {
            database_url,
            bind_address,
            db_max_connections,
            auth: Arc::new(auth),
            bootstrap_admin,
            cors_allowed_origins,
        })
    }
}

/// Comma-separated origins, e.g. `https://portal.example.com,http://localhost:3000`.
///
/// Each entry must be `*` or an `http`/`https` origin without a path.
fn parse_cors_origins(value: &str) -> Result<Vec<String>, ConfigError> {
    let mut origins = Vec::new();
    for origin in value.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        if origin != CORS_ANY_ORIGIN {
            let rest = origin
                .strip_prefix("https://")
                .or_else(|| origin.strip_prefix("http://"))
                .unwrap_or_default();
            let well_formed = !rest.is_empty()
                && !rest.contains('/')
                && rest.chars().all(|c| c.is_ascii_graphic());
            if !well_formed {
                return Err(ConfigError::InvalidCorsOrigin(format!(
                    "CORS_ALLOWED_ORIGINS entry '{}' is not an http(s) origin",
                    origin
                )));
            }
        }
        origins.push(origin.to_string());
    }
    Ok(origins)
}

/// Both email and password must be set for a bootstrap admin; neither set
/// means no bootstrap.
fn bootstrap_admin_from_vars(
    vars: &HashMap<String, String>,
) -> Result<Option<BootstrapAdmin>, ConfigError> {
    let email = vars
        .get("PORTAL_BOOTSTRAP_ADMIN_EMAIL")
        .filter(|v| !v.trim().is_empty());
    let password = vars
        .get("PORTAL_BOOTSTRAP_ADMIN_PASSWORD")
        .filter(|v| !v.is_empty());

    match (email, password) {
        (None, None) => Ok(None),
        (Some(email), Some(password)) => Ok(Some(BootstrapAdmin {
            email: email.trim().to_string(),
            password: SecretString::from(password.clone()),
            name: vars
                .get("PORTAL_BOOTSTRAP_ADMIN_NAME")
                .cloned()
                .unwrap_or_else(|| "Administrator".to_string()),
        })),
        (Some(_), None) => Err(ConfigError::IncompleteBootstrapAdmin(
            "PORTAL_BOOTSTRAP_ADMIN_PASSWORD is required when an email is set".to_string(),
        )),
        (None, Some(_)) => Err(ConfigError::IncompleteBootstrapAdmin(
            "PORTAL_BOOTSTRAP_ADMIN_EMAIL is required when a password is set".to_string(),
        )),
    }
}
