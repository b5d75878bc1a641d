mod common;

use common::TestApp;
use std::sync::Arc;
use std::time::Duration;
use storefront_backend::error::AppError;
use storefront_backend::infra::routing::{ConnectionRouter, RouterSettings};

#[tokio::test]
async fn test_resolve_reuses_pooled_handle() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Reuse Mart", "reuse-mart").await;

    let first = app.state.router.resolve(&tenant_id).await.unwrap();
    let second = app.state.router.resolve(&tenant_id).await.unwrap();

    assert!(Arc::ptr_eq(&first.inventory, &second.inventory), "second resolve should reuse the pooled handle");
}

#[tokio::test]
async fn test_resolve_unknown_tenant_fails() {
    let app = TestApp::new().await;

    let err = app.state.router.resolve("no-such-tenant").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got: {:?}", err);
}

#[tokio::test]
async fn test_resolve_inactive_fails_even_with_warm_pool() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Warm Mart", "warm-mart").await;

    // Warm the pool first
    app.state.router.resolve(&tenant_id).await.unwrap();

    // Deactivate behind the router's back (no invalidate call), so a live
    // pooled connection still exists
    app.state.tenant_repo.set_active(&tenant_id, false).await.unwrap();

    let err = app.state.router.resolve(&tenant_id).await.unwrap_err();
    assert!(matches!(err, AppError::TenantInactive(_)), "got: {:?}", err);
}

#[tokio::test]
async fn test_idle_handles_are_evicted_and_reconnect() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Idle Mart", "idle-mart").await;

    // Separate router instance with an aggressive TTL
    let router = ConnectionRouter::new(
        app.state.tenant_repo.clone(),
        RouterSettings {
            idle_ttl: Duration::from_millis(20),
            max_attempts: 2,
            initial_backoff: Duration::from_millis(10),
        },
    );

    let first = router.resolve(&tenant_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(router.evict_idle().await, 1);

    // A fresh handle is provisioned transparently after eviction
    let second = router.resolve(&tenant_id).await.unwrap();
    assert!(!Arc::ptr_eq(&first.inventory, &second.inventory));

    // The evicted handle still works for an in-flight caller holding it
    assert!(first.inventory.list_products().await.is_ok());
}

#[tokio::test]
async fn test_unreachable_tenant_database_surfaces_after_retries() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Gone Mart", "gone-mart").await;

    let db_path = app.tenant_db_path("gone-mart");
    std::fs::remove_file(&db_path).unwrap();
    let _ = std::fs::remove_file(format!("{}-wal", db_path));
    let _ = std::fs::remove_file(format!("{}-shm", db_path));

    let err = app.state.router.resolve(&tenant_id).await.unwrap_err();
    assert!(matches!(err, AppError::ConnectionUnavailable(_)), "got: {:?}", err);
}
