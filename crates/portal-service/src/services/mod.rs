//! Business logic layer.

pub mod session_service;
pub mod user_service;
