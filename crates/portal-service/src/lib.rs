//! Portal Service Library
//!
//! Admin content portal: a public JSON API for the organization profile and
//! its projects, and an admin API gated by stateless session tokens.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Password hashing and the HS256 session-token codec
//! - `errors` - Error types and their HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Access gate and HTTP metrics
//! - `models` - Data models and request validation
//! - `observability` - Metrics and log correlation
//! - `repositories` - Database access layer
//! - `routes` - Router assembly
//! - `services` - Business logic layer

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
