use crate::domain::models::{
    tenant::Tenant,
    catalog::{CatalogEntry, PendingProduct, ProductCandidate},
    billing::{TenantSubscription, BillingTransaction},
    inventory::{Product, Batch, Depletion, StockReport, PurgeReport},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError>;
    async fn list(&self) -> Result<Vec<Tenant>, AppError>;
    async fn set_active(&self, id: &str, active: bool) -> Result<Tenant, AppError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert_entry(&self, entry: &CatalogEntry) -> Result<CatalogEntry, AppError>;
    async fn update_entry(&self, entry: &CatalogEntry) -> Result<CatalogEntry, AppError>;
    async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogEntry>, AppError>;
    async fn search(&self, category: Option<&str>, query: Option<&str>) -> Result<Vec<CatalogEntry>, AppError>;
    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<CatalogEntry>, AppError>;
    async fn mark_synced(&self, sku: &str, product_name: &str, base_price: f64, synced_at: DateTime<Utc>) -> Result<(), AppError>;

    async fn create_pending(&self, pending: &PendingProduct) -> Result<PendingProduct, AppError>;
    async fn find_pending(&self, id: &str) -> Result<Option<PendingProduct>, AppError>;
    async fn list_pending(&self, status: Option<&str>) -> Result<Vec<PendingProduct>, AppError>;
    async fn resolve_pending(&self, id: &str, status: &str, suggested_match_sku: Option<&str>, score: Option<f64>) -> Result<PendingProduct, AppError>;
    async fn set_pending_score(&self, id: &str, score: f64) -> Result<PendingProduct, AppError>;
}

#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn insert_subscription(&self, subscription: &TenantSubscription) -> Result<TenantSubscription, AppError>;
    async fn find_active_subscription(&self, tenant_id: &str) -> Result<Option<TenantSubscription>, AppError>;
    async fn cancel_subscription(&self, id: &str, end_date: DateTime<Utc>) -> Result<TenantSubscription, AppError>;
    async fn list_subscriptions(&self, tenant_id: &str) -> Result<Vec<TenantSubscription>, AppError>;

    async fn insert_transaction(&self, transaction: &BillingTransaction) -> Result<BillingTransaction, AppError>;
    async fn list_transactions(&self, tenant_id: &str) -> Result<Vec<BillingTransaction>, AppError>;
    async fn latest_settled_transaction(&self, tenant_id: &str) -> Result<Option<BillingTransaction>, AppError>;
}

// Per-tenant store, reached only through a handle resolved by the
// ConnectionRouter. The aggregate stock counter and the batch rows must agree
// after every committed mutation.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> Result<Product, AppError>;
    async fn find_product(&self, id: &str) -> Result<Option<Product>, AppError>;
    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError>;
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
    async fn list_batches(&self, product_id: &str) -> Result<Vec<Batch>, AppError>;
    async fn receive(&self, product_id: &str, quantity: i64, expiry_date: Option<NaiveDate>) -> Result<Batch, AppError>;
    async fn deplete(&self, product_id: &str, quantity: i64) -> Result<Depletion, AppError>;
    async fn reconcile(&self, product_id: &str, today: NaiveDate) -> Result<StockReport, AppError>;
    async fn purge_expired(&self, product_id: &str, today: NaiveDate) -> Result<PurgeReport, AppError>;
}

#[async_trait]
pub trait ProductScorer: Send + Sync {
    async fn score(&self, candidate: &ProductCandidate) -> Result<f64, AppError>;
}

// External provisioning collaborator: creates the tenant's physical database
// after the registry row exists.
#[async_trait]
pub trait TenantProvisioner: Send + Sync {
    async fn provision(&self, tenant: &Tenant) -> Result<(), AppError>;
}
