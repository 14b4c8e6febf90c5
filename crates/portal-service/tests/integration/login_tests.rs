//! Integration tests for POST /api/v1/auth/login
//!
//! Drive the real router with the in-memory credential store, so every
//! path through the session issuer is exercised without Postgres.

use axum::http::{Method, StatusCode};
use portal_service::crypto;
use portal_test_utils::*;
use serde_json::json;

// ============================================================================
// Successful Login
// ============================================================================

/// A known, active account with the right password gets a signed session.
#[tokio::test]
async fn test_login_success_returns_token_and_subject() -> Result<(), anyhow::Error> {
    // Arrange
    let app = TestApp::new();

    // Act
    let response = app.login(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await;

    // Assert
    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);

    let body = &response.body;
    assert_eq!(body["expires_in_seconds"], TEST_TOKEN_TTL_SECONDS);
    assert_eq!(body["subject"]["id"], TEST_ADMIN_ID);
    assert_eq!(body["subject"]["email"], TEST_ADMIN_EMAIL);
    assert_eq!(body["subject"]["name"], "Portal Admin");
    assert_eq!(body["subject"]["role"], "admin");
    assert!(
        body.get("password_hash").is_none() && body["subject"].get("password_hash").is_none(),
        "Login response must not expose the stored hash"
    );

    let token = body["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing token"))?
        .to_string();
    token
        .assert_valid_jwt()
        .assert_for_subject(TEST_ADMIN_ID)
        .assert_for_email(TEST_ADMIN_EMAIL)
        .assert_lifetime(TEST_TOKEN_TTL_SECONDS)
        .assert_expires_in(TEST_TOKEN_TTL_SECONDS);

    Ok(())
}

/// The issued token verifies with the service key and carries the account's claims.
#[tokio::test]
async fn test_login_token_validates_with_service_key() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let token = app
        .login_token(TEST_EDITOR_EMAIL, TEST_EDITOR_PASSWORD)
        .await?;

    let claims = crypto::validate_token(&token, &app.auth().signing_key)?;
    assert_eq!(claims.sub, TEST_EDITOR_ID);
    assert_eq!(claims.email, TEST_EDITOR_EMAIL);
    assert_eq!(claims.exp - claims.iat, TEST_TOKEN_TTL_SECONDS);

    Ok(())
}

/// The configured lifetime flows through to both the claims and the response.
#[tokio::test]
async fn test_login_honors_configured_ttl() -> Result<(), anyhow::Error> {
    let app = TestApp::with_ttl(120);

    let response = app.login(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["expires_in_seconds"], 120);

    let token = response.body["token"].as_str().unwrap_or_default().to_string();
    token.assert_lifetime(120);

    Ok(())
}

/// Two logins for the same account produce independently valid tokens.
#[tokio::test]
async fn test_repeated_logins_each_succeed() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let first = app.login_token(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;
    let second = app.login_token(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;

    for token in [&first, &second] {
        let me = app.get("/admin/me", Some(token)).await;
        assert_eq!(me.status, StatusCode::OK);
    }

    Ok(())
}

// ============================================================================
// Rejected Login
// ============================================================================

/// Wrong password, unknown email and inactive account are indistinguishable.
#[tokio::test]
async fn test_login_failures_are_uniform() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let wrong_password = app.login(TEST_ADMIN_EMAIL, "not-the-password").await;
    let unknown_email = app.login(TEST_UNKNOWN_EMAIL, TEST_ADMIN_PASSWORD).await;
    let inactive = app
        .login(TEST_INACTIVE_EMAIL, TEST_INACTIVE_PASSWORD)
        .await;

    for response in [&wrong_password, &unknown_email, &inactive] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        response
            .body
            .assert_error_code("INVALID_CREDENTIALS")
            .assert_error_message("Invalid email or password");
        assert!(response.body.get("token").is_none());
    }

    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(unknown_email.body, inactive.body);

    Ok(())
}

/// Every login attempt consults the credential store, known account or not.
#[tokio::test]
async fn test_unknown_email_still_consults_store() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    app.login(TEST_UNKNOWN_EMAIL, "whatever-password").await;
    app.login(TEST_ADMIN_EMAIL, "wrong-password").await;

    assert_eq!(app.store().lookups(), 2);
    Ok(())
}

/// Email matching is exact; a differently-cased address is an unknown account.
#[tokio::test]
async fn test_login_email_is_case_sensitive() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app
        .login(&TEST_ADMIN_EMAIL.to_uppercase(), TEST_ADMIN_PASSWORD)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    response.body.assert_error_code("INVALID_CREDENTIALS");
    Ok(())
}

/// Empty credentials are just wrong credentials.
#[tokio::test]
async fn test_login_empty_credentials() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app.login("", "").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    response.body.assert_error_code("INVALID_CREDENTIALS");
    Ok(())
}

/// A body without the required fields is rejected before the issuer runs.
#[tokio::test]
async fn test_login_missing_fields_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": TEST_ADMIN_EMAIL })),
        )
        .await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
    assert_ne!(response.status, StatusCode::OK);
    assert_eq!(app.store().lookups(), 0);
    Ok(())
}

/// An account added after startup can log in immediately.
#[tokio::test]
async fn test_login_with_newly_inserted_account() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    app.store().insert(
        TestUserBuilder::new(555, "new@portal.test")
            .with_password("fresh-password")
            .build(),
    );

    let token = app.login_token("new@portal.test", "fresh-password").await?;
    token.assert_for_subject(555);
    Ok(())
}
