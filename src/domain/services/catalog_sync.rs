use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::catalog::CatalogEntry;
use crate::domain::ports::CatalogRepository;
use crate::error::AppError;
use crate::infra::routing::ConnectionRouter;

#[derive(Debug, Serialize, Default, Clone)]
pub struct ReconciliationSummary {
    pub examined: usize,
    pub refreshed: usize,
    pub failed: usize,
}

pub struct CatalogSyncEngine {
    catalog: Arc<dyn CatalogRepository>,
    router: Arc<ConnectionRouter>,
    staleness: Duration,
}

impl CatalogSyncEngine {
    pub fn new(catalog: Arc<dyn CatalogRepository>, router: Arc<ConnectionRouter>, staleness: Duration) -> Self {
        Self { catalog, router, staleness }
    }

    // Only the owning tenant may write an existing SKU; inserts take ownership
    // for the caller.
    pub async fn upsert(&self, caller_tenant: &str, mut entry: CatalogEntry) -> Result<CatalogEntry, AppError> {
        entry.synced_at = Utc::now();

        match self.catalog.find_by_sku(&entry.sku).await? {
            Some(existing) => {
                if existing.tenant_id != caller_tenant {
                    return Err(AppError::Forbidden(format!(
                        "Catalog entry {} is owned by another tenant", entry.sku
                    )));
                }
                entry.tenant_id = existing.tenant_id;
                self.catalog.update_entry(&entry).await
            }
            None => {
                entry.tenant_id = caller_tenant.to_string();
                self.catalog.insert_entry(&entry).await
            }
        }
    }

    pub async fn read(&self, sku: &str) -> Result<CatalogEntry, AppError> {
        self.catalog.find_by_sku(sku).await?
            .ok_or_else(|| AppError::NotFound(format!("Catalog entry {} not found", sku)))
    }

    // Re-validates stale entries against the owning tenant's live product
    // record. Per-entry isolation: one unreachable tenant never blocks the
    // rest of the batch; its entries stay stale and retry next pass.
    pub async fn run_reconciliation(&self) -> Result<ReconciliationSummary, AppError> {
        let cutoff = Utc::now() - self.staleness;
        let stale = self.catalog.list_stale(cutoff).await?;

        let mut summary = ReconciliationSummary { examined: stale.len(), ..Default::default() };

        for entry in stale {
            match self.refresh_entry(&entry).await {
                Ok(true) => summary.refreshed += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!("Reconciliation failed for SKU {} (tenant {}): {}", entry.sku, entry.tenant_id, e);
                }
            }
        }

        if summary.examined > 0 {
            info!(
                "Catalog reconciliation pass: {} examined, {} refreshed, {} failed",
                summary.examined, summary.refreshed, summary.failed
            );
        }
        Ok(summary)
    }

    async fn refresh_entry(&self, entry: &CatalogEntry) -> Result<bool, AppError> {
        let handle = self.router.resolve(&entry.tenant_id).await?;

        match handle.inventory.find_product_by_sku(&entry.sku).await? {
            Some(live) => {
                self.catalog.mark_synced(&entry.sku, &live.name, live.price, Utc::now()).await?;
                Ok(true)
            }
            None => {
                // Entry outlived the tenant's product; keep it stale so the
                // drift stays visible instead of refreshing a dead record.
                warn!("SKU {} has no live product in tenant {} anymore", entry.sku, entry.tenant_id);
                Ok(false)
            }
        }
    }
}
