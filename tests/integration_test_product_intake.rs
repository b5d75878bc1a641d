mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use async_trait::async_trait;
use common::{StubScorer, TestApp};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use storefront_backend::domain::models::catalog::{CatalogEntry, ProductCandidate};
use storefront_backend::domain::ports::{CatalogRepository, ProductScorer};
use storefront_backend::error::AppError;
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

async fn submit(app: &TestApp, tenant_id: &str, barcode: &str, name: &str) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/products/intake", tenant_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "user_id": "clerk-1",
                "name": name,
                "barcode": barcode,
                "brand": "Acme",
                "category": "snacks"
            }).to_string())).unwrap()
    ).await.unwrap()
}

#[tokio::test]
async fn test_high_confidence_submission_creates_catalog_entry() {
    let app = TestApp::with_scorer(Arc::new(StubScorer { score: 0.95 })).await;
    let tenant_id = app.register_tenant("Snack Shack", "snack-shack").await;

    let res = submit(&app, &tenant_id, "4006381333931", "Acme Crisps 150g").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "created");
    assert_eq!(body["suggested_match_sku"], "4006381333931");
    assert_eq!(body["confidence_score"], 0.95);

    // The catalog entry exists and is owned by the submitter
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/catalog/4006381333931")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let entry = parse_body(res).await;
    assert_eq!(entry["tenant_id"], tenant_id.as_str());
    assert_eq!(entry["product_name"], "Acme Crisps 150g");
}

#[tokio::test]
async fn test_exact_barcode_match_links_without_catalog_write() {
    let app = TestApp::with_scorer(Arc::new(StubScorer { score: 0.95 })).await;
    let first = app.register_tenant("First Mart", "first-mart").await;
    let second = app.register_tenant("Second Mart", "second-mart").await;

    let res = submit(&app, &first, "5000112637922", "Cola Zero 330ml").await;
    assert_eq!(parse_body(res).await["status"], "created");

    // Same barcode from another tenant: matched, not a second row
    let res = submit(&app, &second, "5000112637922", "Coke Zero Can").await;
    let body = parse_body(res).await;
    assert_eq!(body["status"], "matched");
    assert_eq!(body["suggested_match_sku"], "5000112637922");

    // Ownership did not move
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/catalog/5000112637922")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let entry = parse_body(res).await;
    assert_eq!(entry["tenant_id"], first.as_str());
    assert_eq!(entry["product_name"], "Cola Zero 330ml");
}

#[tokio::test]
async fn test_low_confidence_stays_pending_until_reviewed() {
    let app = TestApp::with_scorer(Arc::new(StubScorer { score: 0.4 })).await;
    let tenant_id = app.register_tenant("Maybe Mart", "maybe-mart").await;

    let res = submit(&app, &tenant_id, "1112223334445", "Mystery Snack???").await;
    let body = parse_body(res).await;
    let pending_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["confidence_score"], 0.4);

    // No catalog entry was written
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/catalog/1112223334445")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Shows up in the review queue
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/intake?status=pending")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let queue = parse_body(res).await;
    assert_eq!(queue.as_array().unwrap().len(), 1);

    // Reject it
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/intake/{}/review", pending_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"decision": "rejected"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await["status"], "rejected");

    // Terminal states do not transition further
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/intake/{}/review", pending_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"decision": "rejected"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_manual_review_can_force_match() {
    let app = TestApp::with_scorer(Arc::new(StubScorer { score: 0.4 })).await;
    let owner = app.register_tenant("Owner Mart", "owner-mart").await;
    let other = app.register_tenant("Other Mart", "other-mart").await;

    // Existing catalog entry under a different barcode
    app.create_product(&owner, "Orange Juice 1l", "SKU-OJ-1", 2.5).await;

    let res = submit(&app, &other, "9990001112223", "OJ One Litre").await;
    let pending_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    // Reviewer links it to the existing SKU
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/intake/{}/review", pending_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"decision": "matched", "matched_sku": "SKU-OJ-1"}).to_string())).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    assert_eq!(body["status"], "matched");
    assert_eq!(body["suggested_match_sku"], "SKU-OJ-1");

    // Unknown decision is rejected outright
    let res = submit(&app, &other, "9990001112224", "Another Thing").await;
    let second_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/intake/{}/review", second_id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"decision": "approve"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// Scorer that slips a competing catalog row in during the scoring call, which
// recreates the window where two tenants race to create the same SKU: the
// barcode lookup sees nothing, the insert then collides.
struct RacingScorer {
    inner: Mutex<Option<(Arc<dyn CatalogRepository>, String, String)>>,
}

impl RacingScorer {
    fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    fn arm(&self, catalog: Arc<dyn CatalogRepository>, winner_tenant: String, barcode: String) {
        *self.inner.lock().unwrap() = Some((catalog, winner_tenant, barcode));
    }
}

#[async_trait]
impl ProductScorer for RacingScorer {
    async fn score(&self, _candidate: &ProductCandidate) -> Result<f64, AppError> {
        let armed = self.inner.lock().unwrap().take();
        if let Some((catalog, winner_tenant, barcode)) = armed {
            let entry = CatalogEntry::new(
                barcode,
                "Winner Crisps 150g".to_string(),
                "snacks".to_string(),
                1.0,
                winner_tenant,
            );
            catalog.insert_entry(&entry).await?;
        }
        Ok(0.95)
    }
}

#[tokio::test]
async fn test_sku_creation_race_loser_resolves_as_matched() {
    let scorer = Arc::new(RacingScorer::new());
    let app = TestApp::with_scorer(scorer.clone()).await;
    let winner = app.register_tenant("Winner Mart", "winner-mart").await;
    let loser = app.register_tenant("Loser Mart", "loser-mart").await;

    scorer.arm(app.state.catalog_repo.clone(), winner.clone(), "7612100055557".to_string());

    let res = submit(&app, &loser, "7612100055557", "Loser Crisps 150g").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "matched");
    assert_eq!(body["suggested_match_sku"], "7612100055557");

    // Exactly one catalog row, owned by the winner
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/catalog/7612100055557")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let entry = parse_body(res).await;
    assert_eq!(entry["tenant_id"], winner.as_str());
    assert_eq!(entry["product_name"], "Winner Crisps 150g");
}
