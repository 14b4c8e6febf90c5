//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating signed test tokens and user records.

use crate::crypto_fixtures::test_key_bytes;
use crate::test_ids::{TEST_ADMIN_EMAIL, TEST_ADMIN_ID, TEST_TOKEN_TTL_SECONDS};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use portal_service::config::MIN_BCRYPT_COST;
use portal_service::crypto::{self, Claims};
use portal_service::repositories::users::{User, DEFAULT_ROLE};

/// Builder for signed test tokens
///
/// Defaults to a fresh token for the test admin signed with the seed-1 key,
/// i.e. one the test router accepts.
///
/// # Example
/// ```rust,ignore
/// let expired = TestTokenBuilder::new()
///     .for_user(TEST_EDITOR_ID, TEST_EDITOR_EMAIL)
///     .expired()
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: i64,
    email: String,
    iat: i64,
    exp: i64,
    key: Vec<u8>,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: TEST_ADMIN_ID,
            email: TEST_ADMIN_EMAIL.to_string(),
            iat: now,
            exp: now + TEST_TOKEN_TTL_SECONDS,
            key: test_key_bytes(1),
            algorithm: Algorithm::HS256,
        }
    }

    /// Set the subject
    pub fn for_user(mut self, id: i64, email: &str) -> Self {
        self.sub = id;
        self.email = email.to_string();
        self
    }

    /// Set expiration in seconds from now
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Utc::now().timestamp() + seconds;
        self
    }

    /// Issued two hours ago with a one-minute lifetime
    pub fn expired(mut self) -> Self {
        let issued = Utc::now().timestamp() - 7200;
        self.iat = issued;
        self.exp = issued + 60;
        self
    }

    /// Sign with the key for another seed
    pub fn signed_with_seed(mut self, seed: u8) -> Self {
        self.key = test_key_bytes(seed);
        self
    }

    /// Sign with a different HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The claims this builder will sign
    pub fn claims(&self) -> Claims {
        Claims {
            sub: self.sub,
            email: self.email.clone(),
            iat: self.iat,
            exp: self.exp,
        }
    }

    /// Build the compact token
    pub fn build(self) -> String {
        encode(
            &Header::new(self.algorithm),
            &self.claims(),
            &EncodingKey::from_secret(&self.key),
        )
        .expect("test token encoding should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for credential records
///
/// Hashes at the minimum allowed bcrypt cost to keep tests fast.
pub struct TestUserBuilder {
    id: i64,
    email: String,
    name: String,
    role: String,
    password: String,
    is_active: bool,
}

impl TestUserBuilder {
    pub fn new(id: i64, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            name: "Test User".to_string(),
            role: DEFAULT_ROLE.to_string(),
            password: "test-password".to_string(),
            is_active: true,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> User {
        let now = Utc::now();
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            password_hash: crypto::hash_password(&self.password, MIN_BCRYPT_COST)
                .expect("test password hashing should succeed"),
            role: self.role,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
