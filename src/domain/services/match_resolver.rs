use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::models::catalog::{CatalogEntry, PendingProduct, ProductCandidate};
use crate::domain::ports::{CatalogRepository, ProductScorer};
use crate::error::AppError;

// Confidence-gated merge workflow for new product submissions.
// pending -> matched | created | rejected; terminal states never transition.
pub struct ProductMatchResolver {
    catalog: Arc<dyn CatalogRepository>,
    scorer: Arc<dyn ProductScorer>,
    high_confidence_threshold: f64,
}

impl ProductMatchResolver {
    pub fn new(catalog: Arc<dyn CatalogRepository>, scorer: Arc<dyn ProductScorer>, high_confidence_threshold: f64) -> Self {
        Self { catalog, scorer, high_confidence_threshold }
    }

    pub async fn submit(&self, mut pending: PendingProduct) -> Result<PendingProduct, AppError> {
        pending.status = "pending".to_string();
        let pending = self.catalog.create_pending(&pending).await?;

        // Exact barcode hit: link to the existing entry, no catalog write.
        if let Some(existing) = self.catalog.find_by_sku(&pending.barcode).await? {
            info!("Submission {} matched catalog entry {} by barcode", pending.id, existing.sku);
            return self.catalog.resolve_pending(&pending.id, "matched", Some(&existing.sku), None).await;
        }

        let candidate = ProductCandidate {
            name: pending.product_name.clone(),
            brand: pending.brand.clone(),
            category: pending.category.clone(),
            description: pending.description.clone(),
        };
        let score = self.scorer.score(&candidate).await?;

        if score < self.high_confidence_threshold {
            info!("Submission {} scored {:.2}, below threshold {:.2}; held for review", pending.id, score, self.high_confidence_threshold);
            return self.catalog.set_pending_score(&pending.id, score).await;
        }

        let mut entry = CatalogEntry::new(
            pending.barcode.clone(),
            pending.product_name.clone(),
            pending.category.clone(),
            0.0,
            pending.tenant_id.clone(),
        );
        entry.description = pending.description.clone();
        entry.image_url = pending.image_url.clone();

        match self.catalog.insert_entry(&entry).await {
            Ok(created) => {
                info!("Submission {} auto-created catalog entry {} (score {:.2})", pending.id, created.sku, score);
                self.catalog.resolve_pending(&pending.id, "created", Some(&created.sku), Some(score)).await
            }
            Err(AppError::Conflict(_)) => {
                // Lost the creation race to a concurrent submission of the same
                // barcode; link to the winner's row instead of failing.
                warn!("Submission {} lost the SKU creation race for {}; resolving as matched", pending.id, entry.sku);
                self.catalog.resolve_pending(&pending.id, "matched", Some(&entry.sku), Some(score)).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn review(&self, pending_id: &str, decision: &str, matched_sku: Option<String>) -> Result<PendingProduct, AppError> {
        let pending = self.catalog.find_pending(pending_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Pending submission {} not found", pending_id)))?;

        if pending.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Submission {} is already resolved as '{}'", pending_id, pending.status
            )));
        }

        match decision {
            "matched" => {
                let sku = matched_sku
                    .ok_or_else(|| AppError::Validation("A matched decision requires a target SKU".to_string()))?;
                self.catalog.find_by_sku(&sku).await?
                    .ok_or_else(|| AppError::NotFound(format!("Catalog entry {} not found", sku)))?;
                self.catalog.resolve_pending(pending_id, "matched", Some(&sku), None).await
            }
            "rejected" => self.catalog.resolve_pending(pending_id, "rejected", None, None).await,
            other => Err(AppError::Validation(format!(
                "Unknown review decision '{}' (expected 'matched' or 'rejected')", other
            ))),
        }
    }
}
