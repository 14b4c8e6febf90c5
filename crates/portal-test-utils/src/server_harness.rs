//! Router harness for end-to-end tests without a network listener.
//!
//! `TestApp` wires the real `build_routes` router to an in-memory credential
//! store and a lazily-connected pool, then drives requests with `oneshot`.
//! Routes that only touch the credential store, the token codec or the
//! access gate never dial the database.

use crate::credential_store::InMemoryCredentialStore;
use crate::crypto_fixtures::{test_auth_config, test_auth_config_with_ttl};
use crate::test_ids::{TEST_CORS_ORIGIN, TEST_DATABASE_URL};
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use portal_service::config::{AuthConfig, Config, DEFAULT_DB_MAX_CONNECTIONS};
use portal_service::middleware::AccessGate;
use portal_service::observability::metrics::init_metrics_recorder;
use portal_service::routes::{build_routes, AppState};
use portal_service::services::session_service::SessionIssuer;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tower::ServiceExt;

/// Content routes hit the unreachable test database and fail within this
/// window instead of the pool default.
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(250);

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Shared Prometheus handle for the test process.
///
/// The global recorder can only be installed once; later callers (or a
/// process where something else installed it) get a detached recorder.
pub fn test_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Response captured by [`TestApp::request`].
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Value::String` with the raw text when the body
    /// is not JSON, or `Value::Null` when it is empty.
    pub body: Value,
}

/// The real portal router backed by test fixtures.
///
/// Must be constructed inside a Tokio runtime (the lazy pool spawns its
/// maintenance task on creation).
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_me() -> anyhow::Result<()> {
///     let app = TestApp::new();
///     let token = app.login_token(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;
///     let response = app.get("/admin/me", Some(&token)).await;
///     assert_eq!(response.status, StatusCode::OK);
///     Ok(())
/// }
/// ```
pub struct TestApp {
    router: Router,
    store: Arc<InMemoryCredentialStore>,
    auth: Arc<AuthConfig>,
}

impl TestApp {
    /// Seeded accounts, seed-1 signing key, default test lifetime.
    pub fn new() -> Self {
        Self::build(InMemoryCredentialStore::seeded(), test_auth_config())
    }

    /// As [`TestApp::new`] with a custom session lifetime.
    pub fn with_ttl(ttl_seconds: i64) -> Self {
        Self::build(
            InMemoryCredentialStore::seeded(),
            test_auth_config_with_ttl(ttl_seconds),
        )
    }

    /// Custom credential store and auth configuration.
    pub fn build(store: Arc<InMemoryCredentialStore>, auth: Arc<AuthConfig>) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(DB_ACQUIRE_TIMEOUT)
            .connect_lazy(TEST_DATABASE_URL)
            .expect("test database URL should parse");

        let config = Config {
            database_url: TEST_DATABASE_URL.to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: auth.clone(),
            bootstrap_admin: None,
            cors_allowed_origins: vec![TEST_CORS_ORIGIN.to_string()],
        };

        let state = Arc::new(AppState {
            pool,
            config,
            session_issuer: SessionIssuer::new(store.clone(), auth.clone()),
            gate: Arc::new(AccessGate::new(auth.clone())),
            started_at: Instant::now(),
        });

        Self {
            router: build_routes(state, test_metrics_handle()),
            store,
            auth,
        }
    }

    /// The credential store behind login.
    pub fn store(&self) -> &InMemoryCredentialStore {
        &self.store
    }

    /// The auth configuration shared by the issuer and the gate.
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Send one request through the router.
    ///
    /// `bearer` is sent as `Authorization: Bearer <bearer>`; use
    /// [`TestApp::request_with_authorization`] for raw header values.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let authorization = bearer.map(|token| format!("Bearer {token}"));
        self.request_with_authorization(method, uri, authorization.as_deref(), body)
            .await
    }

    /// Send one request with an arbitrary `Authorization` header value.
    pub async fn request_with_authorization(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let headers: Vec<(HeaderName, &str)> = authorization
            .map(|value| (header::AUTHORIZATION, value))
            .into_iter()
            .collect();
        self.request_with_headers(method, uri, &headers, body).await
    }

    /// Send one request with arbitrary extra headers (e.g. `Origin` for CORS).
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        headers: &[(HeaderName, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name.clone(), *value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("test request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// GET with an optional bearer token.
    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, bearer, None).await
    }

    /// POST /api/v1/auth/login.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Log in and return the issued token.
    ///
    /// # Errors
    ///
    /// Fails when login does not return 200 with a `token` field.
    pub async fn login_token(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let response = self.login(email, password).await;
        if response.status != StatusCode::OK {
            anyhow::bail!("login failed with {}: {}", response.status, response.body);
        }
        response
            .body
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("login response has no token: {}", response.body))
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
