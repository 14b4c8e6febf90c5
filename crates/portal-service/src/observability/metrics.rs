//! Metrics definitions for the portal service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `portal_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome` / `status`: success, error, or a fixed rejection reason
//! - `reason`: the `PortalError::reason` labels
//! - `operation`: bounded by code (select, insert, update, delete, upsert)
//! - `table`: bounded by schema (users, projects, portal_config, audit_logs)
//! - `path`: normalized, numeric segments replaced with `{id}`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder.
///
/// Must be called before any metrics are recorded. Can only succeed once per
/// process.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // bcrypt dominates login latency; cost 12 is ~200-300ms
        .set_buckets_for_metric(
            Matcher::Prefix("portal_bcrypt".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500],
        )
        .map_err(|e| format!("Failed to set bcrypt buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("portal_token_issuance".to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("portal_db".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("portal_http".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record a login attempt.
///
/// Metric: `portal_login_attempts_total`
/// Labels: `outcome` (success, invalid_credentials, error)
pub fn record_login_attempt(outcome: &str) {
    counter!("portal_login_attempts_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record token minting duration and outcome.
///
/// Metric: `portal_token_issuance_duration_seconds`, `portal_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str, duration: Duration) {
    histogram!("portal_token_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());
    counter!("portal_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record an access-gate decision.
///
/// Metric: `portal_token_validations_total`
/// Labels: `status`, `reason`
pub fn record_token_validation(status: &str, reason: Option<&str>) {
    let reason = reason.unwrap_or("none");
    counter!("portal_token_validations_total", "status" => status.to_string(), "reason" => reason.to_string())
        .increment(1);
}

/// Record bcrypt hash/verify duration.
///
/// Metric: `portal_bcrypt_duration_seconds`
/// Labels: `operation` (hash, verify)
pub fn record_bcrypt_duration(operation: &str, duration: Duration) {
    histogram!("portal_bcrypt_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

// ============================================================================
// Data Access Metrics
// ============================================================================

/// Record a database query.
///
/// Metric: `portal_db_query_duration_seconds`, `portal_db_queries_total`
/// Labels: `operation`, `table`, `status`
pub fn record_db_query(operation: &str, table: &str, status: &str, duration: Duration) {
    histogram!("portal_db_query_duration_seconds", "operation" => operation.to_string(), "table" => table.to_string())
        .record(duration.as_secs_f64());
    counter!("portal_db_queries_total", "operation" => operation.to_string(), "table" => table.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record an admin content operation.
///
/// Metric: `portal_admin_operations_total`
/// Labels: `operation`, `status`
pub fn record_admin_operation(operation: &str, status: &str) {
    counter!("portal_admin_operations_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a failed audit-trail write.
///
/// Metric: `portal_audit_log_failures_total`
/// Labels: `action`
pub fn record_audit_log_failure(action: &str) {
    counter!("portal_audit_log_failures_total", "action" => action.to_string()).increment(1);
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `portal_http_requests_total`, `portal_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
///
/// Captures framework-level rejections too (415, 400 on bad JSON, 404, 405).
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("portal_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.clone(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("portal_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Normalize a request path to a bounded label.
///
/// Known routes keep their shape with numeric ids and slugs replaced by
/// placeholders; anything else collapses to `/other`.
fn normalize_path(path: &str) -> String {
    match path {
        "/health"
        | "/metrics"
        | "/api/v1/health"
        | "/api/v1/auth/login"
        | "/api/v1/portal"
        | "/api/v1/projects"
        | "/admin/me"
        | "/admin/account/password"
        | "/admin/projects"
        | "/admin/portal" => path.to_string(),
        _ => normalize_dynamic_path(path),
    }
}

fn normalize_dynamic_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/v1/projects/slug/") {
        if !rest.is_empty() && !rest.contains('/') {
            return "/api/v1/projects/slug/{slug}".to_string();
        }
    }

    for prefix in ["/api/v1/projects/", "/admin/projects/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if is_numeric_id(rest) {
                return format!("{prefix}{{id}}");
            }
        }
    }

    "/other".to_string()
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
