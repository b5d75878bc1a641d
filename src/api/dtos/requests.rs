use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterTenantRequest {
    pub store_name: String,
    pub subdomain: String,
    pub admin_email: String,
}

#[derive(Deserialize)]
pub struct UpsertCatalogEntryRequest {
    pub sku: String,
    pub product_name: String,
    pub category: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct IntakeSubmissionRequest {
    pub user_id: String,
    pub name: String,
    pub barcode: String,
    pub brand: String,
    pub category: String,
    pub description: Option<String>,
    pub image_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewSubmissionRequest {
    pub decision: String,
    pub matched_sku: Option<String>,
}

#[derive(Deserialize)]
pub struct ActivateSubscriptionRequest {
    pub plan_type: String,
    pub monthly_price: f64,
}

#[derive(Deserialize)]
pub struct RecordTransactionRequest {
    pub amount: f64,
    pub payment_method: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentConfirmationRequest {
    pub tenant_id: String,
    pub amount: f64,
    pub payment_method: String,
    pub external_reference: String,
    pub succeeded: bool,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct ReceiveStockRequest {
    pub product_id: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct CatalogSearchQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct PendingListQuery {
    pub status: Option<String>,
}
