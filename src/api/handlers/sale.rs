use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use crate::state::AppState;
use crate::api::dtos::requests::SaleRequest;
use crate::error::AppError;

// Sale event from the storefront: depletes batches first-expired-first-out in
// a single transaction. Hitting the deadline drops the in-flight transaction,
// which rolls it back, so no partial depletion is ever observable.
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<SaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;

    let deadline = Duration::from_millis(state.config.sale_deadline_ms);
    let depletion = match timeout(deadline, handle.inventory.deplete(&payload.product_id, payload.quantity)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Sale for tenant {} product {} hit the {}ms deadline", tenant_id, payload.product_id, state.config.sale_deadline_ms);
            return Err(AppError::ConnectionUnavailable("Sale timed out; safe to retry".to_string()));
        }
    };

    Ok(Json(depletion))
}
