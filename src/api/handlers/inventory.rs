use axum::{extract::{State, Path}, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::dtos::requests::{CreateProductRequest, ReceiveStockRequest};
use crate::domain::models::catalog::CatalogEntry;
use crate::domain::models::inventory::Product;
use std::sync::Arc;
use crate::error::AppError;
use tracing::warn;

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;

    let product = Product::new(payload.name, payload.sku, payload.price);
    let created = handle.inventory.create_product(&product).await?;

    // Mirror into the shared catalog. If the SKU already belongs to another
    // tenant the local product stands alone and the catalog entry keeps its
    // owner; nothing migrates.
    let entry = CatalogEntry::new(
        created.sku.clone(),
        created.name.clone(),
        "uncategorized".to_string(),
        created.price,
        handle.tenant.id.clone(),
    );
    match state.catalog_sync.upsert(&handle.tenant.id, entry).await {
        Ok(_) => {}
        Err(AppError::Forbidden(_)) => {
            warn!("SKU {} is owned by another tenant; skipped catalog sync for tenant {}", created.sku, tenant_id);
        }
        Err(e) => return Err(e),
    }

    Ok(Json(created))
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;
    let products = handle.inventory.list_products().await?;
    Ok(Json(products))
}

pub async fn receive_stock(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<ReceiveStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;
    let batch = handle.inventory
        .receive(&payload.product_id, payload.quantity, payload.expiry_date)
        .await?;
    Ok(Json(batch))
}

pub async fn list_batches(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;
    let batches = handle.inventory.list_batches(&product_id).await?;
    Ok(Json(batches))
}

pub async fn reconcile_product(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;
    let report = handle.inventory
        .reconcile(&product_id, Utc::now().date_naive())
        .await?;
    Ok(Json(report))
}

pub async fn purge_expired(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.router.resolve(&tenant_id).await?;
    let report = handle.inventory
        .purge_expired(&product_id, Utc::now().date_naive())
        .await?;
    Ok(Json(report))
}
