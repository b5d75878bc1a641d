use crate::domain::{
    models::catalog::{CatalogEntry, PendingProduct},
    ports::CatalogRepository,
};
use crate::error::AppError;
use crate::infra::repositories::conflict_on_unique;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresCatalogRepo {
    pool: PgPool,
}

impl PostgresCatalogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepo {
    async fn insert_entry(&self, entry: &CatalogEntry) -> Result<CatalogEntry, AppError> {
        sqlx::query_as::<_, CatalogEntry>(
            "INSERT INTO shared_catalog (sku, product_name, category, description, base_price, image_url, ai_enriched_at, synced_at, tenant_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *"
        )
            .bind(&entry.sku)
            .bind(&entry.product_name)
            .bind(&entry.category)
            .bind(&entry.description)
            .bind(entry.base_price)
            .bind(&entry.image_url)
            .bind(entry.ai_enriched_at)
            .bind(entry.synced_at)
            .bind(&entry.tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Catalog entry already exists for this SKU"))
    }

    async fn update_entry(&self, entry: &CatalogEntry) -> Result<CatalogEntry, AppError> {
        sqlx::query_as::<_, CatalogEntry>(
            "UPDATE shared_catalog SET product_name=$1, category=$2, description=$3, base_price=$4, image_url=$5, ai_enriched_at=$6, synced_at=$7 WHERE sku=$8 RETURNING *"
        )
            .bind(&entry.product_name)
            .bind(&entry.category)
            .bind(&entry.description)
            .bind(entry.base_price)
            .bind(&entry.image_url)
            .bind(entry.ai_enriched_at)
            .bind(entry.synced_at)
            .bind(&entry.sku)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogEntry>, AppError> {
        sqlx::query_as::<_, CatalogEntry>(
            "SELECT * FROM shared_catalog WHERE sku = $1",
        )
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn search(&self, category: Option<&str>, query: Option<&str>) -> Result<Vec<CatalogEntry>, AppError> {
        let pattern = query.map(|q| format!("%{}%", q));
        sqlx::query_as::<_, CatalogEntry>(
            "SELECT * FROM shared_catalog
             WHERE ($1::text IS NULL OR category = $1)
               AND ($2::text IS NULL OR product_name ILIKE $2 OR sku LIKE $2)
             ORDER BY product_name ASC"
        )
            .bind(category)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<CatalogEntry>, AppError> {
        sqlx::query_as::<_, CatalogEntry>(
            "SELECT * FROM shared_catalog WHERE synced_at < $1 ORDER BY synced_at ASC",
        )
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_synced(&self, sku: &str, product_name: &str, base_price: f64, synced_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE shared_catalog SET product_name = $1, base_price = $2, synced_at = $3 WHERE sku = $4",
        )
            .bind(product_name)
            .bind(base_price)
            .bind(synced_at)
            .bind(sku)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn create_pending(&self, pending: &PendingProduct) -> Result<PendingProduct, AppError> {
        sqlx::query_as::<_, PendingProduct>(
            "INSERT INTO pending_product_additions (id, tenant_id, user_id, product_name, barcode, brand, category, description, image_url, confidence_score, status, suggested_match_sku, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *"
        )
            .bind(&pending.id)
            .bind(&pending.tenant_id)
            .bind(&pending.user_id)
            .bind(&pending.product_name)
            .bind(&pending.barcode)
            .bind(&pending.brand)
            .bind(&pending.category)
            .bind(&pending.description)
            .bind(&pending.image_url)
            .bind(pending.confidence_score)
            .bind(&pending.status)
            .bind(&pending.suggested_match_sku)
            .bind(pending.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_pending(&self, id: &str) -> Result<Option<PendingProduct>, AppError> {
        sqlx::query_as::<_, PendingProduct>(
            "SELECT * FROM pending_product_additions WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_pending(&self, status: Option<&str>) -> Result<Vec<PendingProduct>, AppError> {
        sqlx::query_as::<_, PendingProduct>(
            "SELECT * FROM pending_product_additions WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
        )
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn resolve_pending(&self, id: &str, status: &str, suggested_match_sku: Option<&str>, score: Option<f64>) -> Result<PendingProduct, AppError> {
        sqlx::query_as::<_, PendingProduct>(
            "UPDATE pending_product_additions
             SET status = $1, suggested_match_sku = $2, confidence_score = COALESCE($3, confidence_score)
             WHERE id = $4 RETURNING *"
        )
            .bind(status)
            .bind(suggested_match_sku)
            .bind(score)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_pending_score(&self, id: &str, score: f64) -> Result<PendingProduct, AppError> {
        sqlx::query_as::<_, PendingProduct>(
            "UPDATE pending_product_additions SET confidence_score = $1 WHERE id = $2 RETURNING *",
        )
            .bind(score)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
