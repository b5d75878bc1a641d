mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        panic!("Response body is empty. Status: {}", status);
    }
    match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => panic!("Failed to parse JSON: {:?}. Status: {}. Body: {:?}", e, status, String::from_utf8_lossy(&bytes))
    }
}

async fn receive(app: &TestApp, tenant_id: &str, product_id: &str, quantity: i64, expiry: Option<&str>) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/inventory/receive", tenant_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "product_id": product_id,
                "quantity": quantity,
                "expiry_date": expiry
            }).to_string())).unwrap()
    ).await.unwrap()
}

async fn sell(app: &TestApp, tenant_id: &str, product_id: &str, quantity: i64) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/sales", tenant_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "product_id": product_id,
                "quantity": quantity
            }).to_string())).unwrap()
    ).await.unwrap()
}

async fn batches(app: &TestApp, tenant_id: &str, product_id: &str) -> Vec<Value> {
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/{}/inventory/{}/batches", tenant_id, product_id))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    parse_body(res).await.as_array().unwrap().clone()
}

async fn reconcile(app: &TestApp, tenant_id: &str, product_id: &str) -> Value {
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/{}/inventory/{}/reconcile", tenant_id, product_id))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    parse_body(res).await
}

#[tokio::test]
async fn test_deplete_follows_first_expired_first_out() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Fresh Mart", "fresh-mart").await;
    let product_id = app.create_product(&tenant_id, "Yoghurt 500g", "SKU-YOG-1", 1.8).await;

    // Given batches [(qty 5, exp 2024-01-01), (qty 5, exp 2024-06-01)]
    assert_eq!(receive(&app, &tenant_id, &product_id, 5, Some("2024-01-01")).await.status(), StatusCode::OK);
    assert_eq!(receive(&app, &tenant_id, &product_id, 5, Some("2024-06-01")).await.status(), StatusCode::OK);

    // Depleting 7 takes 5 from the earlier expiry, then 2 from the later one
    let res = sell(&app, &tenant_id, &product_id, 7).await;
    assert_eq!(res.status(), StatusCode::OK);
    let depletion = parse_body(res).await;
    assert_eq!(depletion["requested"], 7);
    assert_eq!(depletion["remaining_stock"], 3);
    let draws = depletion["draws"].as_array().unwrap();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0]["expiry_date"], "2024-01-01");
    assert_eq!(draws[0]["taken"], 5);
    assert_eq!(draws[1]["expiry_date"], "2024-06-01");
    assert_eq!(draws[1]["taken"], 2);

    // Leaving [(0, 2024-01-01), (3, 2024-06-01)]
    let remaining = batches(&app, &tenant_id, &product_id).await;
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0]["quantity"], 0);
    assert_eq!(remaining[1]["quantity"], 3);

    // Aggregate agrees with the itemized rows
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["stock"], 3);
    assert_eq!(report["batch_total"], 3);
    assert_eq!(report["drift"], 0);
}

#[tokio::test]
async fn test_batches_without_expiry_deplete_last() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Dry Mart", "dry-mart").await;
    let product_id = app.create_product(&tenant_id, "Canned Beans", "SKU-BEAN-1", 0.9).await;

    assert_eq!(receive(&app, &tenant_id, &product_id, 3, None).await.status(), StatusCode::OK);
    assert_eq!(receive(&app, &tenant_id, &product_id, 2, Some("2025-01-01")).await.status(), StatusCode::OK);

    let res = sell(&app, &tenant_id, &product_id, 4).await;
    let depletion = parse_body(res).await;
    let draws = depletion["draws"].as_array().unwrap();
    assert_eq!(draws[0]["expiry_date"], "2025-01-01");
    assert_eq!(draws[0]["taken"], 2);
    assert!(draws[1]["expiry_date"].is_null());
    assert_eq!(draws[1]["taken"], 2);
    assert_eq!(depletion["remaining_stock"], 1);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_no_partial_state() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Tight Mart", "tight-mart").await;
    let product_id = app.create_product(&tenant_id, "Honey 250g", "SKU-HONEY-1", 6.0).await;

    receive(&app, &tenant_id, &product_id, 4, Some("2027-03-01")).await;

    let res = sell(&app, &tenant_id, &product_id, 10).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let err = parse_body(res).await;
    assert!(err["error"].as_str().unwrap().contains("Insufficient stock"));

    // Nothing moved
    let remaining = batches(&app, &tenant_id, &product_id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["quantity"], 4);
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["stock"], 4);
    assert_eq!(report["drift"], 0);
}

#[tokio::test]
async fn test_invariant_holds_across_interleaved_operations() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Busy Mart", "busy-mart").await;
    let product_id = app.create_product(&tenant_id, "Butter 250g", "SKU-BUTTER-1", 2.6).await;

    receive(&app, &tenant_id, &product_id, 10, Some("2026-09-01")).await;
    sell(&app, &tenant_id, &product_id, 3).await;
    receive(&app, &tenant_id, &product_id, 5, Some("2026-08-20")).await;
    sell(&app, &tenant_id, &product_id, 6).await;
    receive(&app, &tenant_id, &product_id, 2, None).await;
    sell(&app, &tenant_id, &product_id, 1).await;

    // 10 - 3 + 5 - 6 + 2 - 1 = 7
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["stock"], 7);
    assert_eq!(report["batch_total"], 7);
    assert_eq!(report["drift"], 0);
}

#[tokio::test]
async fn test_reconcile_reports_drift_without_correcting() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Skew Mart", "skew-mart").await;
    let product_id = app.create_product(&tenant_id, "Jam 370g", "SKU-JAM-1", 3.4).await;

    receive(&app, &tenant_id, &product_id, 8, Some("2027-01-01")).await;

    // Corrupt the aggregate counter behind the tracker's back
    let tenant_pool = SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}", app.tenant_db_path("skew-mart")))
        .await
        .unwrap();
    sqlx::query("UPDATE products SET stock = 10 WHERE id = ?")
        .bind(&product_id)
        .execute(&tenant_pool)
        .await
        .unwrap();

    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["stock"], 10);
    assert_eq!(report["batch_total"], 8);
    assert_eq!(report["drift"], 2);

    // Report-only: a second pass sees the exact same mismatch
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["drift"], 2);
}

#[tokio::test]
async fn test_purge_expired_removes_only_empty_batches() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Stale Mart", "stale-mart").await;
    let product_id = app.create_product(&tenant_id, "Milk 1l", "SKU-MILK-1", 1.1).await;

    receive(&app, &tenant_id, &product_id, 2, Some("2020-01-01")).await;
    receive(&app, &tenant_id, &product_id, 5, Some("2020-06-01")).await;
    receive(&app, &tenant_id, &product_id, 5, Some("2099-01-01")).await;

    // Drain the oldest batch to zero
    sell(&app, &tenant_id, &product_id, 2).await;

    // Reconcile flags the expired batch that still holds quantity
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["expired_batches"].as_array().unwrap().len(), 1);

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/inventory/{}/purge-expired", tenant_id, product_id))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let purge = parse_body(res).await;
    assert_eq!(purge["purged"], 1);
    let warnings = purge["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["quantity"], 5);
    assert_eq!(warnings[0]["expiry_date"], "2020-06-01");

    // The expired-but-nonempty batch was not deleted
    let remaining = batches(&app, &tenant_id, &product_id).await;
    assert_eq!(remaining.len(), 2);
    let report = reconcile(&app, &tenant_id, &product_id).await;
    assert_eq!(report["stock"], 10);
    assert_eq!(report["batch_total"], 10);
}

#[tokio::test]
async fn test_quantity_validation() {
    let app = TestApp::new().await;
    let tenant_id = app.register_tenant("Picky Mart", "picky-mart").await;
    let product_id = app.create_product(&tenant_id, "Rice 1kg", "SKU-RICE-1", 2.0).await;

    let res = receive(&app, &tenant_id, &product_id, 0, None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = sell(&app, &tenant_id, &product_id, -1).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = receive(&app, &tenant_id, "missing-product", 5, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
