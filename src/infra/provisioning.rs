use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::domain::models::tenant::Tenant;
use crate::domain::ports::TenantProvisioner;
use crate::error::AppError;

// Creates the tenant's physical database and brings its schema up to date.
// Runs after the registry row exists; a failure here leaves the tenant
// registered but inactive.
pub struct DatabaseProvisioner;

impl Default for DatabaseProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseProvisioner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TenantProvisioner for DatabaseProvisioner {
    async fn provision(&self, tenant: &Tenant) -> Result<(), AppError> {
        let url = &tenant.database_url;

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .connect(url)
                .await
                .map_err(|e| AppError::ConnectionUnavailable(format!(
                    "Failed to reach tenant database for {}: {}", tenant.subdomain, e
                )))?;

            sqlx::migrate!("./migrations/tenant_postgres")
                .run(&pool)
                .await
                .map_err(|e| AppError::InternalWithMsg(format!("Tenant migration failed: {}", e)))?;

            pool.close().await;
        } else {
            let opts = SqliteConnectOptions::from_str(url)
                .map_err(AppError::Database)?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

            let pool = SqlitePoolOptions::new()
                .max_connections(2)
                .connect_with(opts)
                .await
                .map_err(|e| AppError::ConnectionUnavailable(format!(
                    "Failed to create tenant database for {}: {}", tenant.subdomain, e
                )))?;

            sqlx::migrate!("./migrations/tenant_sqlite")
                .run(&pool)
                .await
                .map_err(|e| AppError::InternalWithMsg(format!("Tenant migration failed: {}", e)))?;

            pool.close().await;
        }

        info!("Provisioned tenant database for {} ({})", tenant.subdomain, tenant.id);
        Ok(())
    }
}
