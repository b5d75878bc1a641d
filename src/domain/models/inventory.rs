use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: String, sku: String, price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            sku,
            price,
            stock: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub received_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(product_id: String, quantity: i64, expiry_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_id,
            quantity,
            expiry_date,
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct BatchDraw {
    pub batch_id: String,
    pub expiry_date: Option<NaiveDate>,
    pub taken: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct Depletion {
    pub product_id: String,
    pub requested: i64,
    pub draws: Vec<BatchDraw>,
    pub remaining_stock: i64,
}

// Report-only: drift means the aggregate counter and the batch rows disagree,
// which indicates a bug elsewhere. Nothing here corrects it.
#[derive(Debug, Serialize, Clone)]
pub struct StockReport {
    pub product_id: String,
    pub stock: i64,
    pub batch_total: i64,
    pub drift: i64,
    pub expired_batches: Vec<Batch>,
}

impl StockReport {
    pub fn in_sync(&self) -> bool {
        self.drift == 0
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ExpiredWarning {
    pub batch_id: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Serialize, Clone)]
pub struct PurgeReport {
    pub product_id: String,
    pub purged: u64,
    pub warnings: Vec<ExpiredWarning>,
}
