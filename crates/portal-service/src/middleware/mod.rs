//! HTTP middleware.
//!
//! - `auth` - access gate for the admin routes
//! - `http_metrics` - request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_admin, AccessGate, AuthenticatedUser};
pub use http_metrics::http_metrics_middleware;
