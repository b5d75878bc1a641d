use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CatalogSearchQuery, UpsertCatalogEntryRequest};
use crate::domain::models::catalog::CatalogEntry;
use std::sync::Arc;
use crate::error::AppError;

pub async fn read_entry(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.catalog_sync.read(&sku).await?;
    Ok(Json(entry))
}

pub async fn search_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.catalog_repo
        .search(query.category.as_deref(), query.search.as_deref())
        .await?;
    Ok(Json(entries))
}

pub async fn upsert_entry(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<UpsertCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Catalog writes touch the master store only, but a deactivated tenant
    // may not author them.
    let tenant = state.tenant_repo.find_by_id(&tenant_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;
    if !tenant.is_active {
        return Err(AppError::TenantInactive(tenant_id));
    }

    let mut entry = CatalogEntry::new(
        payload.sku,
        payload.product_name,
        payload.category,
        payload.base_price,
        tenant.id.clone(),
    );
    entry.description = payload.description;
    entry.image_url = payload.image_url;

    let saved = state.catalog_sync.upsert(&tenant.id, entry).await?;
    Ok(Json(saved))
}
