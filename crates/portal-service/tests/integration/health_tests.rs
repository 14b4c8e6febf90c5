//! Integration tests for the operational endpoints
//!
//! `/health`, `/api/v1/health` and `/metrics` are public and must answer
//! without a database.

use axum::http::StatusCode;
use portal_test_utils::*;

/// Liveness probe returns plain "OK".
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Arrange
    let app = TestApp::new();

    // Act
    let response = app.get("/health", None).await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "OK", "Health check body should be 'OK'");
    Ok(())
}

/// JSON health reports status, version and uptime.
#[tokio::test]
async fn test_api_health_reports_status() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app.get("/api/v1/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.body["uptime_seconds"].as_i64().is_some());

    let timestamp = response.body["timestamp"].as_str().unwrap_or_default();
    assert!(
        chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(),
        "timestamp should be RFC 3339, got {timestamp:?}"
    );
    Ok(())
}

/// The scrape endpoint exposes the portal metric families after traffic.
#[tokio::test]
async fn test_metrics_endpoint_exposes_portal_metrics() -> Result<(), anyhow::Error> {
    let app = TestApp::new();
    app.login(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await;
    app.get("/admin/me", None).await;

    let response = app.get("/metrics", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default();
    assert!(
        text.contains("portal_login_attempts_total"),
        "missing login counter in:\n{text}"
    );
    assert!(text.contains("portal_token_validations_total"));
    assert!(text.contains("portal_http_requests_total"));
    Ok(())
}

/// Unknown paths fall through to 404.
#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<(), anyhow::Error> {
    let app = TestApp::new();

    let response = app.get("/wp-login.php", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    Ok(())
}
