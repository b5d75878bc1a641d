use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::tenant::Tenant;
use crate::domain::ports::{InventoryRepository, TenantRepository};
use crate::error::AppError;
use crate::infra::repositories::{
    postgres_inventory_repo::PostgresInventoryRepo,
    sqlite_inventory_repo::SqliteInventoryRepo,
};

#[derive(Clone)]
pub struct RouterSettings {
    pub idle_ttl: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

// Capability handle for one tenant's isolated database. Passed explicitly
// through every tenant-scoped call; never a global.
#[derive(Clone)]
pub struct TenantHandle {
    pub tenant: Tenant,
    pub inventory: Arc<dyn InventoryRepository>,
}

impl std::fmt::Debug for TenantHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantHandle")
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

struct PooledHandle {
    inventory: Arc<dyn InventoryRepository>,
    last_used: Instant,
}

pub struct ConnectionRouter {
    tenants: Arc<dyn TenantRepository>,
    settings: RouterSettings,
    handles: RwLock<HashMap<String, PooledHandle>>,
}

impl ConnectionRouter {
    pub fn new(tenants: Arc<dyn TenantRepository>, settings: RouterSettings) -> Self {
        Self {
            tenants,
            settings,
            handles: RwLock::new(HashMap::new()),
        }
    }

    // The active flag is re-checked on every resolve, so a warm pooled handle
    // never outlives a deactivation.
    pub async fn resolve(&self, tenant_id: &str) -> Result<TenantHandle, AppError> {
        let tenant = self.tenants.find_by_id(tenant_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

        if !tenant.is_active {
            return Err(AppError::TenantInactive(tenant_id.to_string()));
        }

        {
            let mut handles = self.handles.write().await;
            if let Some(pooled) = handles.get_mut(tenant_id) {
                pooled.last_used = Instant::now();
                return Ok(TenantHandle { tenant, inventory: pooled.inventory.clone() });
            }
        }

        let inventory = self.connect_with_retry(&tenant.database_url).await?;

        let mut handles = self.handles.write().await;
        let pooled = handles.entry(tenant_id.to_string()).or_insert_with(|| PooledHandle {
            inventory,
            last_used: Instant::now(),
        });
        pooled.last_used = Instant::now();
        Ok(TenantHandle { tenant, inventory: pooled.inventory.clone() })
    }

    pub async fn invalidate(&self, tenant_id: &str) {
        if self.handles.write().await.remove(tenant_id).is_some() {
            debug!("Dropped pooled connection for tenant {}", tenant_id);
        }
    }

    // Handles are Arc-shared, so eviction never interrupts an in-flight
    // operation; the pool closes once the last caller drops its clone.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.settings.idle_ttl;
        let mut handles = self.handles.write().await;
        let before = handles.len();
        handles.retain(|_, pooled| pooled.last_used.elapsed() <= ttl);
        let evicted = before - handles.len();
        if evicted > 0 {
            debug!("Evicted {} idle tenant connection(s)", evicted);
        }
        evicted
    }

    async fn connect_with_retry(&self, database_url: &str) -> Result<Arc<dyn InventoryRepository>, AppError> {
        let mut attempt = 0;
        let mut backoff = self.settings.initial_backoff;

        loop {
            match Self::connect(database_url).await {
                Ok(repo) => return Ok(repo),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.settings.max_attempts {
                        warn!("Tenant database unreachable after {} attempts: {:?}", attempt, e);
                        return Err(AppError::ConnectionUnavailable(format!(
                            "Tenant database unreachable after {} attempts", attempt
                        )));
                    }
                    warn!("Tenant database connect failed (attempt {}). Retrying in {:?}... {:?}", attempt, backoff, e);
                    sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn connect(database_url: &str) -> Result<Arc<dyn InventoryRepository>, sqlx::Error> {
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            Ok(Arc::new(PostgresInventoryRepo::new(pool)))
        } else {
            // The provisioner created the file; a missing one means the tenant
            // database is genuinely gone, not that we should silently recreate it.
            let opts = SqliteConnectOptions::from_str(database_url)?
                .create_if_missing(false)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await?;
            Ok(Arc::new(SqliteInventoryRepo::new(pool)))
        }
    }
}
