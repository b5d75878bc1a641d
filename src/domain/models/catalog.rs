use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CatalogEntry {
    pub sku: String,
    pub product_name: String,
    pub category: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub image_url: Option<String>,
    pub ai_enriched_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
    pub tenant_id: String,
}

impl CatalogEntry {
    pub fn new(sku: String, product_name: String, category: String, base_price: f64, tenant_id: String) -> Self {
        Self {
            sku,
            product_name,
            category,
            description: None,
            base_price,
            image_url: None,
            ai_enriched_at: None,
            synced_at: Utc::now(),
            tenant_id,
        }
    }
}

// Workflow states: pending -> matched | created | rejected. Terminal states
// never transition again.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PendingProduct {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub product_name: String,
    pub barcode: String,
    pub brand: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub confidence_score: Option<f64>,
    pub status: String,
    pub suggested_match_sku: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingProduct {
    pub fn new(tenant_id: String, user_id: String, product_name: String, barcode: String, brand: String, category: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            user_id,
            product_name,
            barcode,
            brand,
            category,
            description: None,
            image_url: None,
            confidence_score: None,
            status: "pending".to_string(),
            suggested_match_sku: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != "pending"
    }
}

// What the scorer sees: the submitted fields, nothing storage-specific.
#[derive(Debug, Clone)]
pub struct ProductCandidate {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: Option<String>,
}
