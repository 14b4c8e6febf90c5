//! Database-backed tests for accounts, projects, the portal profile and the
//! audit trail.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL`; run them
//! with `cargo test -- --ignored`. Each test gets a fresh database with the
//! workspace migrations applied.

use portal_service::config::BootstrapAdmin;
use portal_service::crypto;
use portal_service::errors::PortalError;
use portal_service::models::{CreateProjectRequest, UpdatePortalRequest, UpdateProjectRequest};
use portal_service::repositories::users::{CredentialStore, PgCredentialStore};
use portal_service::repositories::{audit_logs, portal, projects, users};
use portal_service::services::user_service;
use portal_test_utils::*;
use sqlx::PgPool;

fn project(name: &str, slug: &str, status: &str, order: i32) -> CreateProjectRequest {
    CreateProjectRequest {
        name: name.to_string(),
        slug: slug.to_string(),
        description: format!("{name} description"),
        url: format!("https://{slug}.example.com"),
        icon_url: None,
        status: status.to_string(),
        display_order: Some(order),
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_credential_store_hides_inactive_accounts(pool: PgPool) -> Result<(), anyhow::Error> {
    let auth = test_auth_config();
    let user = user_service::create_user(
        &pool,
        &auth,
        TEST_ADMIN_EMAIL,
        "Portal Admin",
        TEST_ADMIN_PASSWORD,
        "admin",
    )
    .await?;

    let store = PgCredentialStore::new(pool.clone());
    let found = store
        .find_active_by_email(TEST_ADMIN_EMAIL)
        .await?
        .ok_or_else(|| anyhow::anyhow!("account not found"))?;
    assert_eq!(found.id, user.id);
    assert!(crypto::verify_password(TEST_ADMIN_PASSWORD, &found.password_hash));

    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await?;

    assert!(store.find_active_by_email(TEST_ADMIN_EMAIL).await?.is_none());
    assert!(users::get_by_id(&pool, user.id).await?.is_some());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_duplicate_email_is_bad_request(pool: PgPool) -> Result<(), anyhow::Error> {
    let auth = test_auth_config();
    user_service::create_user(&pool, &auth, TEST_ADMIN_EMAIL, "A", "password-one", "admin")
        .await?;

    let result =
        user_service::create_user(&pool, &auth, TEST_ADMIN_EMAIL, "B", "password-two", "admin")
            .await;

    assert!(matches!(result, Err(PortalError::BadRequest(_))));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_change_password(pool: PgPool) -> Result<(), anyhow::Error> {
    let auth = test_auth_config();
    let user = user_service::create_user(
        &pool,
        &auth,
        TEST_EDITOR_EMAIL,
        "Editor",
        TEST_EDITOR_PASSWORD,
        "admin",
    )
    .await?;

    let wrong =
        user_service::change_password(&pool, &auth, user.id, "not-current", "new-password-1")
            .await;
    assert!(matches!(wrong, Err(PortalError::BadRequest(_))));

    let same = user_service::change_password(
        &pool,
        &auth,
        user.id,
        TEST_EDITOR_PASSWORD,
        TEST_EDITOR_PASSWORD,
    )
    .await;
    assert!(matches!(same, Err(PortalError::BadRequest(_))));

    let too_long = format!("{}-tail", "x".repeat(crypto::MAX_PASSWORD_BYTES));
    let truncated = user_service::change_password(
        &pool,
        &auth,
        user.id,
        TEST_EDITOR_PASSWORD,
        &too_long,
    )
    .await;
    assert!(matches!(truncated, Err(PortalError::BadRequest(_))));

    user_service::change_password(&pool, &auth, user.id, TEST_EDITOR_PASSWORD, "new-password-1")
        .await?;

    let stored = users::get_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("account vanished"))?;
    assert!(crypto::verify_password("new-password-1", &stored.password_hash));
    assert!(!crypto::verify_password(TEST_EDITOR_PASSWORD, &stored.password_hash));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_bootstrap_admin_only_when_empty(pool: PgPool) -> Result<(), anyhow::Error> {
    let auth = test_auth_config();
    let bootstrap = BootstrapAdmin {
        email: TEST_ADMIN_EMAIL.to_string(),
        password: TEST_ADMIN_PASSWORD.to_string().into(),
        name: "Portal Admin".to_string(),
    };

    assert!(user_service::ensure_bootstrap_admin(&pool, &auth, &bootstrap).await?);
    assert!(!user_service::ensure_bootstrap_admin(&pool, &auth, &bootstrap).await?);
    assert_eq!(users::count_users(&pool).await?, 1);
    Ok(())
}

// ============================================================================
// Projects
// ============================================================================

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_project_lifecycle(pool: PgPool) -> Result<(), anyhow::Error> {
    let id = projects::create(&pool, &project("Alpha", "alpha", "active", 2)).await?;

    let created = projects::get_by_id(&pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("project not found"))?;
    assert_eq!(created.slug, "alpha");
    assert_eq!(created.display_order, 2);

    let update = UpdateProjectRequest {
        name: Some("Alpha Prime".to_string()),
        description: Some(String::new()),
        ..Default::default()
    };
    projects::update(&pool, id, &update).await?;

    let updated = projects::get_by_id(&pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("project not found"))?;
    assert_eq!(updated.name, "Alpha Prime");
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.url, created.url);

    projects::delete(&pool, id).await?;
    assert!(projects::get_by_id(&pool, id).await?.is_none());
    assert!(matches!(
        projects::delete(&pool, id).await,
        Err(PortalError::NotFound(_))
    ));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_public_listing_filters_and_orders(pool: PgPool) -> Result<(), anyhow::Error> {
    projects::create(&pool, &project("Gamma", "gamma", "active", 3)).await?;
    projects::create(&pool, &project("Beta", "beta", "inactive", 1)).await?;
    projects::create(&pool, &project("Delta", "delta", "active", 0)).await?;

    let active: Vec<String> = projects::list_active(&pool)
        .await?
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(active, vec!["delta", "gamma"]);

    assert_eq!(projects::list_all(&pool).await?.len(), 3);
    assert!(projects::get_by_slug(&pool, "beta").await?.is_some());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_duplicate_slug_is_bad_request(pool: PgPool) -> Result<(), anyhow::Error> {
    projects::create(&pool, &project("Alpha", "alpha", "active", 0)).await?;

    let result = projects::create(&pool, &project("Alpha Two", "alpha", "active", 0)).await;

    assert!(matches!(result, Err(PortalError::BadRequest(_))));
    Ok(())
}

// ============================================================================
// Portal profile and audit trail
// ============================================================================

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_portal_upsert_creates_then_merges(pool: PgPool) -> Result<(), anyhow::Error> {
    assert!(portal::get(&pool).await?.is_none());

    let nameless = UpdatePortalRequest {
        website: Some("https://example.org".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        portal::upsert(&pool, &nameless).await,
        Err(PortalError::BadRequest(_))
    ));

    let created = portal::upsert(
        &pool,
        &UpdatePortalRequest {
            name: Some("Example Org".to_string()),
            email: Some("hello@example.org".to_string()),
            ..Default::default()
        },
    )
    .await?;

    let merged = portal::upsert(&pool, &nameless).await?;
    assert_eq!(merged.id, created.id);
    assert_eq!(merged.name, "Example Org");
    assert_eq!(merged.email.as_deref(), Some("hello@example.org"));
    assert_eq!(merged.website.as_deref(), Some("https://example.org"));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn test_audit_log_records_action(pool: PgPool) -> Result<(), anyhow::Error> {
    let entry = audit_logs::log_action(
        &pool,
        None,
        "create_project",
        Some("projects"),
        Some(42),
        Some("created via test"),
    )
    .await?;

    assert_eq!(entry.action, "create_project");
    assert_eq!(entry.resource.as_deref(), Some("projects"));
    assert_eq!(entry.resource_id, Some(42));
    assert!(entry.user_id.is_none());
    Ok(())
}
