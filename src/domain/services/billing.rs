use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use crate::domain::models::billing::{
    settles_immediately, BillingStanding, BillingTransaction, TenantSubscription,
};
use crate::domain::ports::BillingRepository;
use crate::error::AppError;

const BILLING_PERIOD_DAYS: i64 = 30;

pub struct BillingLedger {
    repo: Arc<dyn BillingRepository>,
    grace_days: i64,
}

impl BillingLedger {
    pub fn new(repo: Arc<dyn BillingRepository>, grace_days: i64) -> Self {
        Self { repo, grace_days }
    }

    pub async fn activate_subscription(&self, tenant_id: &str, plan_type: String, monthly_price: f64) -> Result<TenantSubscription, AppError> {
        if self.repo.find_active_subscription(tenant_id).await?.is_some() {
            return Err(AppError::Conflict(
                "Tenant already has an active subscription".to_string(),
            ));
        }

        // The partial unique index catches the concurrent-activation race the
        // check above cannot see.
        let subscription = TenantSubscription::new(tenant_id.to_string(), plan_type, monthly_price);
        let created = self.repo.insert_subscription(&subscription).await?;
        info!("Subscription {} activated for tenant {} ({})", created.id, tenant_id, created.plan_type);
        Ok(created)
    }

    pub async fn cancel_subscription(&self, tenant_id: &str) -> Result<TenantSubscription, AppError> {
        let active = self.repo.find_active_subscription(tenant_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} has no active subscription", tenant_id)))?;

        let cancelled = self.repo.cancel_subscription(&active.id, Utc::now()).await?;
        info!("Subscription {} cancelled for tenant {}", cancelled.id, tenant_id);
        Ok(cancelled)
    }

    pub async fn list_subscriptions(&self, tenant_id: &str) -> Result<Vec<TenantSubscription>, AppError> {
        self.repo.list_subscriptions(tenant_id).await
    }

    // Direct recording is only for methods that settle as recorded. Card and
    // wallet payments enter the ledger exclusively through confirm_payment, so
    // an unconfirmed transaction is never visible.
    pub async fn record_transaction(&self, tenant_id: &str, amount: f64, payment_method: &str, description: Option<String>) -> Result<BillingTransaction, AppError> {
        if !settles_immediately(payment_method) {
            return Err(AppError::Validation(format!(
                "Payment method '{}' settles through the payment confirmation callback", payment_method
            )));
        }

        let transaction = BillingTransaction::settled(
            tenant_id.to_string(),
            amount,
            payment_method.to_string(),
            description,
        );
        self.repo.insert_transaction(&transaction).await
    }

    pub async fn confirm_payment(&self, tenant_id: &str, amount: f64, payment_method: &str, external_reference: String, succeeded: bool) -> Result<Option<BillingTransaction>, AppError> {
        if !succeeded {
            info!("Payment {} for tenant {} reported as failed; nothing recorded", external_reference, tenant_id);
            return Ok(None);
        }

        let mut transaction = BillingTransaction::settled(
            tenant_id.to_string(),
            amount,
            payment_method.to_string(),
            None,
        );
        transaction.external_reference = Some(external_reference);
        let recorded = self.repo.insert_transaction(&transaction).await?;
        Ok(Some(recorded))
    }

    pub async fn list_transactions(&self, tenant_id: &str) -> Result<Vec<BillingTransaction>, AppError> {
        self.repo.list_transactions(tenant_id).await
    }

    // Good standing: an active subscription whose most recent settled payment
    // (or its own start) falls within one billing period plus the grace window.
    pub async fn standing(&self, tenant_id: &str) -> Result<BillingStanding, AppError> {
        let active = self.repo.find_active_subscription(tenant_id).await?;
        let last_settled = self.repo.latest_settled_transaction(tenant_id).await?;
        let last_settled_at = last_settled.map(|t| t.transaction_date);

        let in_good_standing = match &active {
            None => false,
            Some(subscription) => {
                let window_start = Utc::now() - Duration::days(BILLING_PERIOD_DAYS + self.grace_days);
                let paid_recently = last_settled_at.map(|d| d >= window_start).unwrap_or(false);
                let started_recently = subscription.start_date >= window_start;
                paid_recently || started_recently
            }
        };

        Ok(BillingStanding {
            tenant_id: tenant_id.to_string(),
            active_subscription: active.is_some(),
            in_good_standing,
            last_settled_at,
        })
    }
}
