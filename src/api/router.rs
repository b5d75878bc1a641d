use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, tenant, catalog, intake, billing, inventory, sale};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Tenant registry
        .route("/api/v1/tenants", post(tenant::register_tenant).get(tenant::list_tenants))
        .route("/api/v1/tenants/by-subdomain/{subdomain}", get(tenant::get_tenant_by_subdomain))
        .route("/api/v1/tenants/{tenant_id}", get(tenant::get_tenant))
        .route("/api/v1/tenants/{tenant_id}/deactivate", post(tenant::deactivate_tenant))
        .route("/api/v1/tenants/{tenant_id}/reactivate", post(tenant::reactivate_tenant))

        // Shared catalog
        .route("/api/v1/catalog", get(catalog::search_catalog))
        .route("/api/v1/catalog/{sku}", get(catalog::read_entry))
        .route("/api/v1/{tenant_id}/catalog", put(catalog::upsert_entry))

        // Product intake workflow
        .route("/api/v1/{tenant_id}/products/intake", post(intake::submit_product))
        .route("/api/v1/intake", get(intake::list_submissions))
        .route("/api/v1/intake/{pending_id}/review", post(intake::review_submission))

        // Subscription & billing ledger
        .route("/api/v1/{tenant_id}/subscription", post(billing::activate_subscription))
        .route("/api/v1/{tenant_id}/subscription/cancel", post(billing::cancel_subscription))
        .route("/api/v1/{tenant_id}/subscriptions", get(billing::list_subscriptions))
        .route("/api/v1/{tenant_id}/billing/transactions", post(billing::record_transaction).get(billing::list_transactions))
        .route("/api/v1/{tenant_id}/billing/standing", get(billing::billing_standing))
        .route("/api/v1/billing/confirm", post(billing::confirm_payment))

        // Per-tenant inventory
        .route("/api/v1/{tenant_id}/products", post(inventory::create_product).get(inventory::list_products))
        .route("/api/v1/{tenant_id}/inventory/receive", post(inventory::receive_stock))
        .route("/api/v1/{tenant_id}/inventory/{product_id}/batches", get(inventory::list_batches))
        .route("/api/v1/{tenant_id}/inventory/{product_id}/reconcile", get(inventory::reconcile_product))
        .route("/api/v1/{tenant_id}/inventory/{product_id}/purge-expired", post(inventory::purge_expired))

        // Sale events
        .route("/api/v1/{tenant_id}/sales", post(sale::create_sale))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
