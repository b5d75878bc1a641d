use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub store_name: String,
    pub subdomain: String,
    pub admin_email: String,
    #[serde(skip_serializing)]
    pub database_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(store_name: String, subdomain: String, admin_email: String, database_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            store_name,
            subdomain,
            admin_email,
            database_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
