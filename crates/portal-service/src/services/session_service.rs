//! Session issuance: credential lookup, password verification, token minting.

use crate::config::AuthConfig;
use crate::crypto;
use crate::errors::PortalError;
use crate::models::{SessionResult, SubjectSummary};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{
    record_bcrypt_duration, record_login_attempt, record_token_issuance,
};
use crate::repositories::users::CredentialStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Secret behind the per-issuer dummy hash.
const DUMMY_PASSWORD: &str = "portal-dummy-password-for-unknown-accounts";

/// Cost-12 fallback, used only if hashing the dummy at startup fails.
const FALLBACK_DUMMY_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Exchanges email + password for a signed session token.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn CredentialStore>,
    auth: Arc<AuthConfig>,
    /// Verified when no account matches. Hashed at the configured cost so
    /// unknown emails cost the same bcrypt work as wrong passwords.
    dummy_hash: Arc<str>,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, auth: Arc<AuthConfig>) -> Self {
        let dummy_hash = crypto::hash_password(DUMMY_PASSWORD, auth.bcrypt_cost)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    target: "portal.services.session",
                    error = %e,
                    cost = auth.bcrypt_cost,
                    "Could not hash dummy password at configured cost, using fallback"
                );
                FALLBACK_DUMMY_HASH.to_string()
            });

        Self {
            store,
            auth,
            dummy_hash: Arc::from(dummy_hash),
        }
    }

    /// Authenticate and issue a session.
    ///
    /// Unknown email, inactive account and wrong password all return
    /// `InvalidCredentials`.
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email)))]
    pub async fn login(&self, email: &str, secret: &str) -> Result<SessionResult, PortalError> {
        let user = self.store.find_active_by_email(email).await.map_err(|e| {
            tracing::error!(target: "portal.services.session", error = %e, "Credential lookup failed");
            record_login_attempt("error");
            e
        })?;

        let known_account = user.is_some();
        let verify_start = Instant::now();
        let verified = match &user {
            Some(user) => crypto::verify_password(secret, &user.password_hash),
            None => {
                let _ = crypto::verify_password(secret, &self.dummy_hash);
                false
            }
        };
        record_bcrypt_duration("verify", verify_start.elapsed());

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::debug!(
                    target: "portal.services.session",
                    known_account = known_account,
                    "Login rejected"
                );
                record_login_attempt("invalid_credentials");
                return Err(PortalError::InvalidCredentials);
            }
        };

        let mint_start = Instant::now();
        let token = crypto::mint_token(
            user.id,
            &user.email,
            &self.auth.signing_key,
            self.auth.token_ttl_seconds,
        )
        .map_err(|e| {
            record_token_issuance("error", mint_start.elapsed());
            record_login_attempt("error");
            e
        })?;
        record_token_issuance("success", mint_start.elapsed());
        record_login_attempt("success");

        tracing::info!(target: "portal.services.session", user_id = user.id, "Session issued");

        Ok(SessionResult {
            token,
            expires_in_seconds: self.auth.token_ttl_seconds,
            subject: SubjectSummary {
                id: user.id,
                email: user.email,
                name: user.name,
                role: user.role,
            },
        })
    }
}
