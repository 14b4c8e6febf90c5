//! Credential verification and session-token codec.
//!
//! Passwords are hashed with bcrypt. Session tokens are HS256 JWS compact
//! tokens signed with the service's symmetric key. Both halves are pure
//! functions of their inputs plus the clock; the `_at` variants take the
//! instant explicitly so tests can pin it.

use crate::config::{SigningKey, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::PortalError;
use crate::observability::metrics::record_bcrypt_duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use tracing::instrument;

/// Longest password bcrypt digests in full.
///
/// bcrypt ignores everything past this many bytes, so longer secrets are
/// refused rather than silently cut.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Maximum accepted token size in bytes (8KB).
///
/// Checked before any base64 decoding or signature work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Session token claims.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the account the token was issued to.
    pub sub: i64,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. Always `iat + ttl`.
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &self.sub)
            .field("email", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

// ============================================================================
// Credential Verifier
// ============================================================================

/// Hash a password with bcrypt at the given cost.
///
/// A fresh salt is drawn for every call, so hashing the same secret twice
/// yields different strings.
///
/// # Errors
///
/// - `BadRequest`: the secret is longer than `MAX_PASSWORD_BYTES`
/// - `Internal`: the cost is outside `MIN_BCRYPT_COST..=MAX_BCRYPT_COST` or
///   bcrypt itself fails
#[instrument(skip_all)]
pub fn hash_password(secret: &str, cost: u32) -> Result<String, PortalError> {
    if secret.len() > MAX_PASSWORD_BYTES {
        return Err(PortalError::BadRequest(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }

    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        tracing::error!(
            target: "portal.crypto",
            cost = cost,
            min = MIN_BCRYPT_COST,
            max = MAX_BCRYPT_COST,
            "Refusing to hash with bcrypt cost outside allowed range"
        );
        return Err(PortalError::Internal);
    }

    let start = Instant::now();
    let result = bcrypt::hash(secret, cost);
    record_bcrypt_duration("hash", start.elapsed());

    result.map_err(|e| {
        tracing::error!(target: "portal.crypto", error = %e, "Password hashing failed");
        PortalError::Internal
    })
}

/// Check a password against a stored bcrypt hash.
///
/// Returns `false` on mismatch, for hashes bcrypt cannot parse and for
/// candidates longer than `MAX_PASSWORD_BYTES`.
#[instrument(skip_all)]
pub fn verify_password(secret: &str, hash: &str) -> bool {
    if secret.len() > MAX_PASSWORD_BYTES {
        tracing::debug!(target: "portal.crypto", "Candidate password exceeds bcrypt input limit");
        return false;
    }

    match bcrypt::verify(secret, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::debug!(target: "portal.crypto", error = %e, "Stored password hash is malformed");
            false
        }
    }
}

// ============================================================================
// Token Codec
// ============================================================================

/// Mint a session token valid for `ttl_seconds` from now.
pub fn mint_token(
    sub: i64,
    email: &str,
    key: &SigningKey,
    ttl_seconds: i64,
) -> Result<String, PortalError> {
    mint_token_at(sub, email, key, ttl_seconds, chrono::Utc::now().timestamp())
}

/// Mint a session token issued at `issued_at`.
///
/// The output is a pure function of the arguments: the same inputs give a
/// byte-identical token.
#[instrument(skip_all, fields(sub = sub))]
pub fn mint_token_at(
    sub: i64,
    email: &str,
    key: &SigningKey,
    ttl_seconds: i64,
    issued_at: i64,
) -> Result<String, PortalError> {
    if ttl_seconds <= 0 {
        return Err(PortalError::TokenIssuanceFailed(format!(
            "token lifetime must be positive, got {ttl_seconds}"
        )));
    }

    let exp = issued_at.checked_add(ttl_seconds).ok_or_else(|| {
        PortalError::TokenIssuanceFailed("token expiry overflows i64".to_string())
    })?;

    let claims = Claims {
        sub,
        email: email.to_string(),
        iat: issued_at,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| PortalError::TokenIssuanceFailed(format!("signing failed: {e}")))
}

/// Validate a session token against the current time.
pub fn validate_token(token: &str, key: &SigningKey) -> Result<Claims, PortalError> {
    validate_token_at(token, key, chrono::Utc::now().timestamp())
}

/// Validate a session token as of `now`.
///
/// Checks run in a fixed order: size, shape, signature, payload decoding,
/// expiry. The signature covers the encoded header and payload, so any
/// change to either surfaces as `BadSignature` rather than a decode error.
///
/// # Errors
///
/// - `MalformedToken`: oversized, not three non-empty segments, or
///   undecodable header/payload
/// - `BadSignature`: signature mismatch or an algorithm other than HS256
/// - `Expired`: `now` is past `exp`
#[instrument(skip_all)]
pub fn validate_token_at(token: &str, key: &SigningKey, now: i64) -> Result<Claims, PortalError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "portal.crypto",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(PortalError::MalformedToken);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        tracing::debug!(
            target: "portal.crypto",
            segments = segments.len(),
            "Token rejected: not a three-part compact token"
        );
        return Err(PortalError::MalformedToken);
    }

    // Expiry is compared against the injected `now` below instead of the
    // library's wall clock.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.required_spec_claims = HashSet::new();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                tracing::debug!(target: "portal.crypto", error = %e, "Token signature rejected");
                PortalError::BadSignature
            }
            _ => {
                tracing::debug!(target: "portal.crypto", error = %e, "Token could not be decoded");
                PortalError::MalformedToken
            }
        })?;

    let claims = token_data.claims;
    if now > claims.exp {
        tracing::debug!(
            target: "portal.crypto",
            exp = claims.exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(PortalError::Expired);
    }

    Ok(claims)
}
