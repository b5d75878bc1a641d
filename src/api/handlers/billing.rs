use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::{ActivateSubscriptionRequest, PaymentConfirmationRequest, RecordTransactionRequest},
    responses::PaymentConfirmationResponse,
};
use std::sync::Arc;
use crate::error::AppError;

async fn require_tenant(state: &AppState, tenant_id: &str) -> Result<(), AppError> {
    state.tenant_repo.find_by_id(tenant_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;
    Ok(())
}

pub async fn activate_subscription(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<ActivateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_tenant(&state, &tenant_id).await?;
    let subscription = state.billing
        .activate_subscription(&tenant_id, payload.plan_type, payload.monthly_price)
        .await?;
    Ok(Json(subscription))
}

pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state.billing.cancel_subscription(&tenant_id).await?;
    Ok(Json(cancelled))
}

pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subscriptions = state.billing.list_subscriptions(&tenant_id).await?;
    Ok(Json(subscriptions))
}

pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<RecordTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_tenant(&state, &tenant_id).await?;
    let transaction = state.billing
        .record_transaction(&tenant_id, payload.amount, &payload.payment_method, payload.description)
        .await?;
    Ok(Json(transaction))
}

// Callback from the external payment collaborator. Card and wallet payments
// reach the ledger only through here, and only when succeeded is true.
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PaymentConfirmationRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_tenant(&state, &payload.tenant_id).await?;
    let recorded = state.billing
        .confirm_payment(
            &payload.tenant_id,
            payload.amount,
            &payload.payment_method,
            payload.external_reference,
            payload.succeeded,
        )
        .await?;

    Ok(Json(PaymentConfirmationResponse {
        recorded: recorded.is_some(),
        transaction_id: recorded.map(|t| t.id),
    }))
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.billing.list_transactions(&tenant_id).await?;
    Ok(Json(transactions))
}

pub async fn billing_standing(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_tenant(&state, &tenant_id).await?;
    let standing = state.billing.standing(&tenant_id).await?;
    Ok(Json(standing))
}
