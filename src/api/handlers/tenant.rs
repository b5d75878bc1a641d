use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::RegisterTenantRequest,
    responses::TenantRegisteredResponse,
};
use crate::domain::models::tenant::Tenant;
use std::sync::Arc;
use crate::error::AppError;
use tracing::{info, warn};

fn valid_subdomain(subdomain: &str) -> bool {
    !subdomain.is_empty()
        && subdomain.chars().next().map(|c| c.is_ascii_lowercase() || c.is_ascii_digit()).unwrap_or(false)
        && subdomain.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn register_tenant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !valid_subdomain(&payload.subdomain) {
        return Err(AppError::Validation(
            "Subdomain must be lowercase alphanumeric (dashes allowed)".to_string(),
        ));
    }

    let database_url = state.config.tenant_database_url(&payload.subdomain);
    let tenant = Tenant::new(payload.store_name, payload.subdomain, payload.admin_email, database_url);

    // Two-phase onboarding: the registry row first, then the physical
    // database. A provisioning failure leaves the row in place but inactive,
    // so the audit trail survives and an operator can see what happened.
    let created = state.tenant_repo.create(&tenant).await?;
    info!("Tenant registered: {} ({})", created.subdomain, created.id);

    if let Err(e) = state.provisioner.provision(&created).await {
        warn!("Provisioning failed for tenant {}; marking inactive: {}", created.id, e);
        state.tenant_repo.set_active(&created.id, false).await?;
        return Err(e);
    }

    Ok(Json(TenantRegisteredResponse {
        tenant_id: created.id,
        subdomain: created.subdomain,
    }))
}

pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_id(&tenant_id).await?
        .ok_or(AppError::NotFound("Tenant not found".into()))?;

    Ok(Json(tenant))
}

pub async fn get_tenant_by_subdomain(
    State(state): State<Arc<AppState>>,
    Path(subdomain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_subdomain(&subdomain).await?
        .ok_or(AppError::NotFound("Tenant not found".into()))?;

    Ok(Json(tenant))
}

pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenant_repo.list().await?;
    Ok(Json(tenants))
}

pub async fn deactivate_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.set_active(&tenant_id, false).await?;
    state.router.invalidate(&tenant_id).await;
    info!("Tenant deactivated: {}", tenant_id);
    Ok(Json(tenant))
}

pub async fn reactivate_tenant(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.set_active(&tenant_id, true).await?;
    info!("Tenant reactivated: {}", tenant_id);
    Ok(Json(tenant))
}
