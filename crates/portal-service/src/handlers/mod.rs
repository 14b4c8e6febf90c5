pub mod admin_handler;
pub mod auth_handler;
pub mod health;
pub mod metrics;
pub mod public_handler;

pub use health::{api_health, health_check};
pub use metrics::metrics_handler;
