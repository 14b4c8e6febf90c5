//! Integration tests for the admin access gate
//!
//! Every rejection must render the same 401 regardless of why the token was
//! refused; only a fresh token signed with the service key reaches a handler.

use axum::http::{header, HeaderValue, Method, StatusCode};
use jsonwebtoken::Algorithm;
use portal_test_utils::*;
use serde_json::json;

// ============================================================================
// Rejections
// ============================================================================

/// No Authorization header.
#[tokio::test]
async fn test_missing_header_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app.get("/admin/me", None).await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    Ok(())
}

/// Schemes other than exactly `Bearer <token>`.
#[tokio::test]
async fn test_wrong_scheme_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new().build();

    for value in [
        "Token abc".to_string(),
        "Bearer ".to_string(),
        "Bearer".to_string(),
        format!("bearer {token}"),
        format!("Basic {token}"),
        format!("Bearer  {token}"),
    ] {
        let response = app
            .request_with_authorization(Method::GET, "/admin/me", Some(&value), None)
            .await;
        assert_unauthorized(response.status, &response.headers, &response.body);
    }

    Ok(())
}

/// Tokens that are not three base64url segments of JSON.
#[tokio::test]
async fn test_malformed_token_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    for token in ["abc", "a.b", "a.b.c.d", "..", "not.a.jwt"] {
        let response = app.get("/admin/me", Some(token)).await;
        assert_unauthorized(response.status, &response.headers, &response.body);
    }

    Ok(())
}

/// A token signed with a different key.
#[tokio::test]
async fn test_foreign_signature_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new().signed_with_seed(2).build();

    let response = app.get("/admin/me", Some(&token)).await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    Ok(())
}

/// Correct key, wrong HMAC algorithm.
#[tokio::test]
async fn test_other_algorithm_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new()
        .with_algorithm(Algorithm::HS512)
        .build();

    let response = app.get("/admin/me", Some(&token)).await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    Ok(())
}

/// Past `exp`, even when the signature is good.
#[tokio::test]
async fn test_expired_token_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new().expired().build();

    let response = app.get("/admin/me", Some(&token)).await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    Ok(())
}

/// A token that was valid, with its payload swapped for another subject.
#[tokio::test]
async fn test_tampered_payload_rejected() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let genuine = app.login_token(TEST_EDITOR_EMAIL, TEST_EDITOR_PASSWORD).await?;
    let forged = TestTokenBuilder::new()
        .for_user(TEST_ADMIN_ID, TEST_ADMIN_EMAIL)
        .build();

    let genuine_parts: Vec<&str> = genuine.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let spliced = format!(
        "{}.{}.{}",
        genuine_parts[0], forged_parts[1], genuine_parts[2]
    );

    let response = app.get("/admin/me", Some(&spliced)).await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    Ok(())
}

/// All rejection reasons produce byte-identical bodies.
#[tokio::test]
async fn test_rejections_are_indistinguishable() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let expired = TestTokenBuilder::new().expired().build();
    let foreign = TestTokenBuilder::new().signed_with_seed(9).build();

    let responses = vec![
        app.get("/admin/me", None).await,
        app.request_with_authorization(Method::GET, "/admin/me", Some("Token abc"), None)
            .await,
        app.get("/admin/me", Some("garbage")).await,
        app.get("/admin/me", Some(&expired)).await,
        app.get("/admin/me", Some(&foreign)).await,
    ];

    let first = &responses[0];
    for response in &responses {
        assert_eq!(response.status, first.status);
        assert_eq!(response.body, first.body);
        assert_eq!(
            response.headers.get("www-authenticate"),
            first.headers.get("www-authenticate")
        );
    }

    Ok(())
}

/// Every admin route sits behind the gate, including write methods.
#[tokio::test]
async fn test_all_admin_routes_are_gated() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let routes = [
        (Method::GET, "/admin/me", None),
        (
            Method::PUT,
            "/admin/account/password",
            Some(json!({ "current_password": "x", "new_password": "y" })),
        ),
        (Method::GET, "/admin/projects", None),
        (Method::POST, "/admin/projects", Some(json!({}))),
        (Method::GET, "/admin/projects/1", None),
        (Method::PUT, "/admin/projects/1", Some(json!({}))),
        (Method::DELETE, "/admin/projects/1", None),
        (Method::GET, "/admin/portal", None),
        (Method::PUT, "/admin/portal", Some(json!({}))),
    ];

    for (method, uri, body) in routes {
        let response = app.request(method.clone(), uri, None, body).await;
        assert_eq!(
            response.status,
            StatusCode::UNAUTHORIZED,
            "{method} {uri} must require a session"
        );
    }

    Ok(())
}

// ============================================================================
// Accepted Tokens
// ============================================================================

/// A freshly issued token reaches the handler with the caller's identity.
#[tokio::test]
async fn test_fresh_token_reaches_handler() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = app.login_token(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;

    let response = app.get("/admin/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    assert_eq!(response.body["user_id"], TEST_ADMIN_ID);
    assert_eq!(response.body["email"], TEST_ADMIN_EMAIL);
    assert!(response.headers.get("www-authenticate").is_none());
    Ok(())
}

/// The gate trusts the signature alone; it does not look the subject up.
#[tokio::test]
async fn test_gate_does_not_consult_credential_store() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new()
        .for_user(TEST_EDITOR_ID, TEST_EDITOR_EMAIL)
        .build();

    let response = app.get("/admin/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user_id"], TEST_EDITOR_ID);
    assert_eq!(app.store().lookups(), 0);
    Ok(())
}

/// A token that has not reached its expiry second is still accepted.
#[tokio::test]
async fn test_token_near_expiry_accepted() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    let token = TestTokenBuilder::new().expires_in(30).build();

    let response = app.get("/admin/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

/// Public routes ignore the Authorization header entirely.
#[tokio::test]
async fn test_public_routes_ignore_bad_tokens() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app.get("/health", Some("garbage")).await;

    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

// ============================================================================
// Browser Clients
// ============================================================================

/// CORS preflights for admin routes are answered without a session.
#[tokio::test]
async fn test_cors_preflight_answered_before_gate() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app
        .request_with_headers(
            Method::OPTIONS,
            "/admin/projects",
            &[
                (header::ORIGIN, TEST_CORS_ORIGIN),
                (header::ACCESS_CONTROL_REQUEST_METHOD, "POST"),
                (
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "authorization,content-type",
                ),
            ],
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static(TEST_CORS_ORIGIN))
    );
    let allowed_headers = response
        .headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("authorization"), "got {allowed_headers:?}");
    Ok(())
}

/// Gate rejections still carry CORS headers so browsers can read the 401.
#[tokio::test]
async fn test_rejection_carries_cors_headers() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app
        .request_with_headers(
            Method::GET,
            "/admin/me",
            &[(header::ORIGIN, TEST_CORS_ORIGIN)],
            None,
        )
        .await;

    assert_unauthorized(response.status, &response.headers, &response.body);
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static(TEST_CORS_ORIGIN))
    );
    Ok(())
}
