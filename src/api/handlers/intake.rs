use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{IntakeSubmissionRequest, PendingListQuery, ReviewSubmissionRequest};
use crate::domain::models::catalog::PendingProduct;
use std::sync::Arc;
use crate::error::AppError;

pub async fn submit_product(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<IntakeSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    // The workflow writes only the master store; an inactive tenant may not
    // feed the catalog.
    let tenant = state.tenant_repo.find_by_id(&tenant_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;
    if !tenant.is_active {
        return Err(AppError::TenantInactive(tenant_id));
    }

    let mut pending = PendingProduct::new(
        tenant.id.clone(),
        payload.user_id,
        payload.name,
        payload.barcode,
        payload.brand,
        payload.category,
    );
    pending.description = payload.description;
    pending.image_url = payload.image_ref;

    let resolved = state.match_resolver.submit(pending).await?;
    Ok(Json(resolved))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PendingListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = state.catalog_repo.list_pending(query.status.as_deref()).await?;
    Ok(Json(submissions))
}

pub async fn review_submission(
    State(state): State<Arc<AppState>>,
    Path(pending_id): Path<String>,
    Json(payload): Json<ReviewSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.match_resolver
        .review(&pending_id, &payload.decision, payload.matched_sku)
        .await?;
    Ok(Json(resolved))
}
