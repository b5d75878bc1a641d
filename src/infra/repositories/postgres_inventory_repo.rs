use crate::domain::{
    models::inventory::{Batch, BatchDraw, Depletion, ExpiredWarning, Product, PurgeReport, StockReport},
    ports::InventoryRepository,
};
use crate::error::AppError;
use crate::infra::repositories::conflict_on_unique;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

pub struct PostgresInventoryRepo {
    pool: PgPool,
}

impl PostgresInventoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for PostgresInventoryRepo {
    async fn create_product(&self, product: &Product) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, sku, price, stock, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
        )
            .bind(&product.id)
            .bind(&product.name)
            .bind(&product.sku)
            .bind(product.price)
            .bind(product.stock)
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Product already exists for this SKU"))
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_batches(&self, product_id: &str) -> Result<Vec<Batch>, AppError> {
        sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE product_id = $1 ORDER BY expiry_date ASC NULLS LAST, received_at ASC"
        )
            .bind(product_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn receive(&self, product_id: &str, quantity: i64, expiry_date: Option<NaiveDate>) -> Result<Batch, AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation("Received quantity must be positive".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query("UPDATE products SET stock = stock + $1, updated_at = $2 WHERE id = $3")
            .bind(quantity)
            .bind(Utc::now())
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Product {} not found", product_id)));
        }

        let batch = Batch::new(product_id.to_string(), quantity, expiry_date);
        let created = sqlx::query_as::<_, Batch>(
            "INSERT INTO batches (id, product_id, quantity, expiry_date, received_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
            .bind(&batch.id)
            .bind(&batch.product_id)
            .bind(batch.quantity)
            .bind(batch.expiry_date)
            .bind(batch.received_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn deplete(&self, product_id: &str, quantity: i64) -> Result<Depletion, AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation("Depleted quantity must be positive".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the product serializes concurrent depletions without
        // touching any other tenant's rows.
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        if product.stock < quantity {
            return Err(AppError::InsufficientStock { requested: quantity, available: product.stock });
        }

        let batches = sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE product_id = $1 AND quantity > 0 ORDER BY expiry_date ASC NULLS LAST, received_at ASC"
        )
            .bind(product_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let mut remaining = quantity;
        let mut draws = Vec::new();
        for batch in batches {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.quantity);
            sqlx::query("UPDATE batches SET quantity = quantity - $1 WHERE id = $2")
                .bind(take)
                .bind(&batch.id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            draws.push(BatchDraw { batch_id: batch.id, expiry_date: batch.expiry_date, taken: take });
            remaining -= take;
        }

        if remaining > 0 {
            return Err(AppError::Conflict(format!(
                "Batch quantities for product {} do not cover the aggregate stock counter", product_id
            )));
        }

        let updated = sqlx::query_as::<_, Product>(
            "UPDATE products SET stock = stock - $1, updated_at = $2 WHERE id = $3 RETURNING *"
        )
            .bind(quantity)
            .bind(Utc::now())
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(Depletion {
            product_id: product_id.to_string(),
            requested: quantity,
            draws,
            remaining_stock: updated.stock,
        })
    }

    async fn reconcile(&self, product_id: &str, today: NaiveDate) -> Result<StockReport, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        let (batch_total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM batches WHERE product_id = $1"
        )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let expired_batches = sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE product_id = $1 AND quantity > 0 AND expiry_date IS NOT NULL AND expiry_date < $2 ORDER BY expiry_date ASC"
        )
            .bind(product_id)
            .bind(today)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(StockReport {
            product_id: product_id.to_string(),
            stock: product.stock,
            batch_total,
            drift: product.stock - batch_total,
            expired_batches,
        })
    }

    async fn purge_expired(&self, product_id: &str, today: NaiveDate) -> Result<PurgeReport, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let flagged = sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE product_id = $1 AND quantity > 0 AND expiry_date IS NOT NULL AND expiry_date < $2"
        )
            .bind(product_id)
            .bind(today)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let purged = sqlx::query(
            "DELETE FROM batches WHERE product_id = $1 AND quantity = 0 AND expiry_date IS NOT NULL AND expiry_date < $2"
        )
            .bind(product_id)
            .bind(today)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .rows_affected();

        tx.commit().await.map_err(AppError::Database)?;

        Ok(PurgeReport {
            product_id: product_id.to_string(),
            purged,
            warnings: flagged
                .into_iter()
                .filter_map(|b| b.expiry_date.map(|exp| ExpiredWarning {
                    batch_id: b.id,
                    quantity: b.quantity,
                    expiry_date: exp,
                }))
                .collect(),
        })
    }
}
