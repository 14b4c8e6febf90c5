//! # Portal Test Utilities
//!
//! Shared test utilities for the portal service.
//!
//! This crate provides:
//! - Deterministic signing keys and auth configuration
//! - An in-memory `CredentialStore` with seeded accounts
//! - Token and user builders (TestTokenBuilder, TestUserBuilder)
//! - A router harness driving the real routes via `oneshot`
//! - Custom assertions (TokenAssertions, ErrorBodyAssertions)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use portal_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let app = TestApp::new();
//!     let token = app.login_token(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;
//!
//!     token.assert_valid_jwt().assert_for_subject(TEST_ADMIN_ID);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod credential_store;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use credential_store::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
