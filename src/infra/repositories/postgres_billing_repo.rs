use crate::domain::{
    models::billing::{BillingTransaction, TenantSubscription},
    ports::BillingRepository,
};
use crate::error::AppError;
use crate::infra::repositories::conflict_on_unique;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresBillingRepo {
    pool: PgPool,
}

impl PostgresBillingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingRepository for PostgresBillingRepo {
    async fn insert_subscription(&self, subscription: &TenantSubscription) -> Result<TenantSubscription, AppError> {
        sqlx::query_as::<_, TenantSubscription>(
            "INSERT INTO tenant_subscriptions (id, tenant_id, plan_type, monthly_price, status, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
        )
            .bind(&subscription.id)
            .bind(&subscription.tenant_id)
            .bind(&subscription.plan_type)
            .bind(subscription.monthly_price)
            .bind(&subscription.status)
            .bind(subscription.start_date)
            .bind(subscription.end_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Tenant already has an active subscription"))
    }

    async fn find_active_subscription(&self, tenant_id: &str) -> Result<Option<TenantSubscription>, AppError> {
        sqlx::query_as::<_, TenantSubscription>(
            "SELECT * FROM tenant_subscriptions WHERE tenant_id = $1 AND status = 'active'",
        )
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn cancel_subscription(&self, id: &str, end_date: DateTime<Utc>) -> Result<TenantSubscription, AppError> {
        sqlx::query_as::<_, TenantSubscription>(
            "UPDATE tenant_subscriptions SET status = 'cancelled', end_date = $1 WHERE id = $2 RETURNING *",
        )
            .bind(end_date)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_subscriptions(&self, tenant_id: &str) -> Result<Vec<TenantSubscription>, AppError> {
        sqlx::query_as::<_, TenantSubscription>(
            "SELECT * FROM tenant_subscriptions WHERE tenant_id = $1 ORDER BY start_date DESC",
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn insert_transaction(&self, transaction: &BillingTransaction) -> Result<BillingTransaction, AppError> {
        sqlx::query_as::<_, BillingTransaction>(
            "INSERT INTO billing_transactions (id, tenant_id, amount, transaction_date, status, payment_method, description, external_reference)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *"
        )
            .bind(&transaction.id)
            .bind(&transaction.tenant_id)
            .bind(transaction.amount)
            .bind(transaction.transaction_date)
            .bind(&transaction.status)
            .bind(&transaction.payment_method)
            .bind(&transaction.description)
            .bind(&transaction.external_reference)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_transactions(&self, tenant_id: &str) -> Result<Vec<BillingTransaction>, AppError> {
        sqlx::query_as::<_, BillingTransaction>(
            "SELECT * FROM billing_transactions WHERE tenant_id = $1 ORDER BY transaction_date DESC",
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn latest_settled_transaction(&self, tenant_id: &str) -> Result<Option<BillingTransaction>, AppError> {
        sqlx::query_as::<_, BillingTransaction>(
            "SELECT * FROM billing_transactions WHERE tenant_id = $1 AND status = 'settled' ORDER BY transaction_date DESC LIMIT 1",
        )
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
