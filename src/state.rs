use std::sync::Arc;
use crate::domain::ports::{
    BillingRepository, CatalogRepository, TenantProvisioner, TenantRepository,
};
use crate::domain::services::billing::BillingLedger;
use crate::domain::services::catalog_sync::CatalogSyncEngine;
use crate::domain::services::match_resolver::ProductMatchResolver;
use crate::infra::routing::ConnectionRouter;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub catalog_repo: Arc<dyn CatalogRepository>,
    pub billing_repo: Arc<dyn BillingRepository>,
    pub router: Arc<ConnectionRouter>,
    pub provisioner: Arc<dyn TenantProvisioner>,
    pub match_resolver: Arc<ProductMatchResolver>,
    pub catalog_sync: Arc<CatalogSyncEngine>,
    pub billing: Arc<BillingLedger>,
}
