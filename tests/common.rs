use storefront_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::catalog::ProductCandidate,
    domain::ports::{BillingRepository, CatalogRepository, ProductScorer, TenantRepository},
    domain::services::{
        billing::BillingLedger,
        catalog_sync::CatalogSyncEngine,
        match_resolver::ProductMatchResolver,
    },
    infra::provisioning::DatabaseProvisioner,
    infra::repositories::{
        sqlite_billing_repo::SqliteBillingRepo,
        sqlite_catalog_repo::SqliteCatalogRepo,
        sqlite_tenant_repo::SqliteTenantRepo,
    },
    infra::routing::{ConnectionRouter, RouterSettings},
    background::start_background_worker,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::Request,
    Router,
};
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

pub struct StubScorer {
    pub score: f64,
}

#[async_trait]
impl ProductScorer for StubScorer {
    async fn score(&self, _candidate: &ProductCandidate) -> Result<f64, AppError> {
        Ok(self.score)
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub tenant_dir: String,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_scorer(Arc::new(StubScorer { score: 0.2 })).await
    }

    pub async fn with_scorer(scorer: Arc<dyn ProductScorer>) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        let db_filename = format!("test_master_{}.db", run_id);
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);
        let tenant_dir = format!("test_tenants_{}", run_id);
        std::fs::create_dir_all(&tenant_dir).expect("Failed to create tenant dir");

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/master_sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            tenant_database_base: format!("sqlite://{}", tenant_dir),
            port: 0,
            scorer_api_key: String::new(),
            high_confidence_threshold: 0.85,
            catalog_staleness_hours: 24,
            sync_interval_secs: 3600,
            router_idle_ttl_secs: 600,
            router_max_attempts: 2,
            router_backoff_ms: 10,
            billing_grace_days: 14,
            sale_deadline_ms: 5000,
        };

        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(SqliteTenantRepo::new(pool.clone()));
        let catalog_repo: Arc<dyn CatalogRepository> = Arc::new(SqliteCatalogRepo::new(pool.clone()));
        let billing_repo: Arc<dyn BillingRepository> = Arc::new(SqliteBillingRepo::new(pool.clone()));

        let router = Arc::new(ConnectionRouter::new(
            tenant_repo.clone(),
            RouterSettings {
                idle_ttl: Duration::from_secs(config.router_idle_ttl_secs),
                max_attempts: config.router_max_attempts,
                initial_backoff: Duration::from_millis(config.router_backoff_ms),
            },
        ));

        let match_resolver = Arc::new(ProductMatchResolver::new(
            catalog_repo.clone(),
            scorer,
            config.high_confidence_threshold,
        ));

        let catalog_sync = Arc::new(CatalogSyncEngine::new(
            catalog_repo.clone(),
            router.clone(),
            chrono::Duration::hours(config.catalog_staleness_hours),
        ));

        let billing = Arc::new(BillingLedger::new(billing_repo.clone(), config.billing_grace_days));

        let state = Arc::new(AppState {
            config: config.clone(),
            tenant_repo,
            catalog_repo,
            billing_repo,
            router,
            provisioner: Arc::new(DatabaseProvisioner::new()),
            match_resolver,
            catalog_sync,
            billing,
        });

        // Start Background Worker
        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            tenant_dir,
            state,
        }
    }

    pub async fn register_tenant(&self, store_name: &str, subdomain: &str) -> String {
        let payload = json!({
            "store_name": store_name,
            "subdomain": subdomain,
            "admin_email": format!("{}@example.com", subdomain)
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tenants")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Tenant registration failed in test helper: status {}", response.status());
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["tenant_id"].as_str().expect("No tenant_id in response").to_string()
    }

    pub async fn create_product(&self, tenant_id: &str, name: &str, sku: &str, price: f64) -> String {
        let payload = json!({ "name": name, "sku": sku, "price": price });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/{}/products", tenant_id))
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Product creation failed in test helper: status {}", response.status());
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["id"].as_str().expect("No product id in response").to_string()
    }

    pub fn tenant_db_path(&self, subdomain: &str) -> String {
        format!("{}/store_{}.db", self.tenant_dir, subdomain)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_dir_all(&self.tenant_dir);
    }
}
