use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TenantSubscription {
    pub id: String,
    pub tenant_id: String,
    pub plan_type: String,
    pub monthly_price: f64,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TenantSubscription {
    pub fn new(tenant_id: String, plan_type: String, monthly_price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            plan_type,
            monthly_price,
            status: "active".to_string(),
            start_date: Utc::now(),
            end_date: None,
        }
    }
}

// Append-only ledger row. Amount and date are immutable once recorded;
// corrections are new offsetting transactions.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BillingTransaction {
    pub id: String,
    pub tenant_id: String,
    pub amount: f64,
    pub transaction_date: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub description: Option<String>,
    pub external_reference: Option<String>,
}

impl BillingTransaction {
    pub fn settled(tenant_id: String, amount: f64, payment_method: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            amount,
            transaction_date: Utc::now(),
            status: "settled".to_string(),
            payment_method,
            description,
            external_reference: None,
        }
    }
}

// Cash and bank transfers settle as recorded; card and wallet payments only
// enter the ledger through the external confirmation callback.
pub fn settles_immediately(payment_method: &str) -> bool {
    matches!(payment_method, "cash" | "bank_transfer")
}

#[derive(Debug, Serialize, Clone)]
pub struct BillingStanding {
    pub tenant_id: String,
    pub active_subscription: bool,
    pub in_good_standing: bool,
    pub last_settled_at: Option<DateTime<Utc>>,
}
