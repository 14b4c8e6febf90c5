//! Custom test assertions for expressive tests
//!
//! Token assertions decode without verifying the signature; signature
//! checks belong to the codec tests.

use axum::http::{header, HeaderMap, StatusCode};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Session claims as they appear on the wire
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

fn decode_segment<T: for<'de> Deserialize<'de>>(token: &str, index: usize) -> T {
    let segment = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {index}"));
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {index}: {e}"));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Failed to parse JWT segment {index} JSON: {e}"))
}

/// Custom assertions for session tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject(TEST_ADMIN_ID)
///     .assert_lifetime(3600);
/// ```
pub trait TokenAssertions {
    /// Assert three segments, an HS256 JWT header and a full claims payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the `sub` claim
    fn assert_for_subject(&self, subject: i64) -> &Self;

    /// Assert the `email` claim
    fn assert_for_email(&self, email: &str) -> &Self;

    /// Assert `exp - iat`
    fn assert_lifetime(&self, seconds: i64) -> &Self;

    /// Assert the token expires within `seconds` of now (5 s tolerance)
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header: JwtHeader = decode_segment(self, 0);
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims: JwtClaims = decode_segment(self, 1);
        assert!(
            claims.exp > claims.iat,
            "exp ({}) must be after iat ({})",
            claims.exp,
            claims.iat
        );

        self
    }

    fn assert_for_subject(&self, subject: i64) -> &Self {
        let claims: JwtClaims = decode_segment(self, 1);
        assert_eq!(
            claims.sub, subject,
            "Expected subject {}, got {}",
            subject, claims.sub
        );
        self
    }

    fn assert_for_email(&self, email: &str) -> &Self {
        let claims: JwtClaims = decode_segment(self, 1);
        assert_eq!(claims.email, email, "Unexpected email claim");
        self
    }

    fn assert_lifetime(&self, seconds: i64) -> &Self {
        let claims: JwtClaims = decode_segment(self, 1);
        assert_eq!(
            claims.exp - claims.iat,
            seconds,
            "Expected a {} second lifetime",
            seconds
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims: JwtClaims = decode_segment(self, 1);
        let expires_in = claims.exp - chrono::Utc::now().timestamp();

        assert!(
            (expires_in - seconds).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }
}

/// Assertions on the `{"error": {"code", "message"}}` body
pub trait ErrorBodyAssertions {
    fn assert_error_code(&self, code: &str) -> &Self;
    fn assert_error_message(&self, message: &str) -> &Self;
}

impl ErrorBodyAssertions for serde_json::Value {
    fn assert_error_code(&self, code: &str) -> &Self {
        assert_eq!(
            self["error"]["code"], code,
            "Unexpected error code in body: {self}"
        );
        self
    }

    fn assert_error_message(&self, message: &str) -> &Self {
        assert_eq!(
            self["error"]["message"], message,
            "Unexpected error message in body: {self}"
        );
        self
    }
}

/// Assert the uniform access-gate rejection: 401, Bearer challenge, fixed body.
pub fn assert_unauthorized(status: StatusCode, headers: &HeaderMap, body: &serde_json::Value) {
    assert_eq!(status, StatusCode::UNAUTHORIZED, "body: {body}");
    let challenge = headers
        .get(header::WWW_AUTHENTICATE)
        .expect("401 must carry WWW-Authenticate")
        .to_str()
        .expect("WWW-Authenticate should be ASCII");
    assert!(
        challenge.starts_with("Bearer"),
        "Unexpected challenge: {challenge}"
    );
    body.assert_error_code("UNAUTHORIZED")
        .assert_error_message("unauthorized");
}
