//! Deterministic key fixtures for testing
//!
//! The same seed always produces the same signing key.

use crate::test_ids::TEST_TOKEN_TTL_SECONDS;
use portal_service::config::{AuthConfig, SigningKey, MIN_BCRYPT_COST};
use std::sync::Arc;

/// Deterministic 32-byte HS256 key material for a seed.
pub fn test_key_bytes(seed: u8) -> Vec<u8> {
    (0u8..32)
        .map(|i| seed.wrapping_mul(31).wrapping_add(i.wrapping_mul(7)) ^ 0x5a)
        .collect()
}

/// Deterministic signing key for a seed.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(1);
/// assert_eq!(key.as_bytes(), test_signing_key(1).as_bytes());
/// ```
pub fn test_signing_key(seed: u8) -> SigningKey {
    SigningKey::new(test_key_bytes(seed)).expect("32-byte test key is never empty")
}

/// Auth configuration with the seed-1 key, `TEST_TOKEN_TTL_SECONDS`, and the
/// cheapest allowed bcrypt cost.
pub fn test_auth_config() -> Arc<AuthConfig> {
    test_auth_config_with_ttl(TEST_TOKEN_TTL_SECONDS)
}

/// As [`test_auth_config`] with a custom token lifetime.
pub fn test_auth_config_with_ttl(ttl_seconds: i64) -> Arc<AuthConfig> {
    Arc::new(
        AuthConfig::new(test_signing_key(1), ttl_seconds, MIN_BCRYPT_COST)
            .expect("test auth config should be valid"),
    )
}
