//! HTTP routes for the portal service.
//!
//! Defines the Axum router and application state.

use crate::config::{Config, CORS_ANY_ORIGIN};
use crate::errors::PortalError;
use crate::handlers::{self, admin_handler, auth_handler, public_handler};
use crate::middleware::{http_metrics_middleware, require_admin, AccessGate};
use crate::services::session_service::SessionIssuer;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Request timeout applied to every route.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long browsers may cache a preflight answer.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,

    /// Login: credential lookup, verification and token minting.
    pub session_issuer: SessionIssuer,

    /// Token check for the admin routes.
    pub gate: Arc<AccessGate>,

    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

/// Build the application routes.
///
/// - `/health`, `/metrics`, `/api/v1/health` - operational, public
/// - `/api/v1/auth/login` - login, public
/// - `/api/v1/portal`, `/api/v1/projects[/:id | /slug/:slug]` - content, public
/// - `/admin/*` - behind the access gate
///
/// Layer order (innermost first): CatchPanicLayer, TraceLayer, TimeoutLayer,
/// CorsLayer, HTTP metrics.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/health", get(handlers::api_health))
        .route("/api/v1/auth/login", post(auth_handler::handle_login))
        .route("/api/v1/portal", get(public_handler::get_portal))
        .route("/api/v1/projects", get(public_handler::list_projects))
        .route("/api/v1/projects/:id", get(public_handler::get_project))
        .route(
            "/api/v1/projects/slug/:slug",
            get(public_handler::get_project_by_slug),
        )
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let admin_routes = Router::new()
        .route("/admin/me", get(admin_handler::handle_me))
        .route(
            "/admin/account/password",
            put(admin_handler::handle_change_password),
        )
        .route(
            "/admin/projects",
            get(admin_handler::handle_list_projects).post(admin_handler::handle_create_project),
        )
        .route(
            "/admin/projects/:id",
            get(admin_handler::handle_get_project)
                .put(admin_handler::handle_update_project)
                .delete(admin_handler::handle_delete_project),
        )
        .route(
            "/admin/portal",
            get(admin_handler::handle_get_portal).put(admin_handler::handle_update_portal),
        )
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_admin,
        ))
        .with_state(state);

    with_common_layers(public_routes.merge(metrics_routes).merge(admin_routes), cors)
}

fn with_common_layers(router: Router, cors: CorsLayer) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS policy for browser clients.
///
/// Preflights are answered here, ahead of routing, so `OPTIONS` never
/// reaches the access gate.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == CORS_ANY_ORIGIN) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

/// Render a handler panic as the standard 500 envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(target: "portal.routes", panic = %detail, "Request handler panicked");

    PortalError::Internal.into_response()
}
