//! In-memory `CredentialStore` for driving login without Postgres.

use crate::test_ids::*;
use crate::token_builders::TestUserBuilder;
use async_trait::async_trait;
use portal_service::errors::PortalError;
use portal_service::repositories::users::{CredentialStore, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Credential store backed by a `HashMap`, keyed by exact email.
///
/// Mirrors the Postgres store: inactive accounts are invisible to lookups.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, User>>,
    lookups: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the fixed test accounts: an active admin, an
    /// active editor and an inactive account.
    pub fn seeded() -> Arc<Self> {
        let store = Self::new();
        store.insert(
            TestUserBuilder::new(TEST_ADMIN_ID, TEST_ADMIN_EMAIL)
                .with_name("Portal Admin")
                .with_password(TEST_ADMIN_PASSWORD)
                .build(),
        );
        store.insert(
            TestUserBuilder::new(TEST_EDITOR_ID, TEST_EDITOR_EMAIL)
                .with_name("Portal Editor")
                .with_role("editor")
                .with_password(TEST_EDITOR_PASSWORD)
                .build(),
        );
        store.insert(
            TestUserBuilder::new(TEST_INACTIVE_ID, TEST_INACTIVE_EMAIL)
                .with_password(TEST_INACTIVE_PASSWORD)
                .inactive()
                .build(),
        );
        Arc::new(store)
    }

    /// Add or replace an account.
    pub fn insert(&self, user: User) {
        self.users
            .lock()
            .expect("credential store mutex poisoned")
            .insert(user.email.clone(), user);
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every subsequent lookup fail with a database error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, PortalError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortalError::Database(
                "in-memory store configured to fail".to_string(),
            ));
        }

        Ok(self
            .users
            .lock()
            .expect("credential store mutex poisoned")
            .get(email)
            .filter(|u| u.is_active)
            .cloned())
    }
}
