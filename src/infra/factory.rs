use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use chrono::Duration as ChronoDuration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{BillingRepository, CatalogRepository, TenantRepository};
use crate::domain::services::billing::BillingLedger;
use crate::domain::services::catalog_sync::CatalogSyncEngine;
use crate::domain::services::match_resolver::ProductMatchResolver;
use crate::infra::ai::gemini_scorer::GeminiScorer;
use crate::infra::provisioning::DatabaseProvisioner;
use crate::infra::routing::{ConnectionRouter, RouterSettings};
use crate::infra::repositories::{
    postgres_billing_repo::PostgresBillingRepo, postgres_catalog_repo::PostgresCatalogRepo,
    postgres_tenant_repo::PostgresTenantRepo,
    sqlite_billing_repo::SqliteBillingRepo, sqlite_catalog_repo::SqliteCatalogRepo,
    sqlite_tenant_repo::SqliteTenantRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let (tenant_repo, catalog_repo, billing_repo): (
        Arc<dyn TenantRepository>,
        Arc<dyn CatalogRepository>,
        Arc<dyn BillingRepository>,
    ) = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL master connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        (
            Arc::new(PostgresTenantRepo::new(pool.clone())),
            Arc::new(PostgresCatalogRepo::new(pool.clone())),
            Arc::new(PostgresBillingRepo::new(pool.clone())),
        )
    } else {
        info!("Initializing SQLite master connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        (
            Arc::new(SqliteTenantRepo::new(pool.clone())),
            Arc::new(SqliteCatalogRepo::new(pool.clone())),
            Arc::new(SqliteBillingRepo::new(pool.clone())),
        )
    };

    let router = Arc::new(ConnectionRouter::new(
        tenant_repo.clone(),
        RouterSettings {
            idle_ttl: Duration::from_secs(config.router_idle_ttl_secs),
            max_attempts: config.router_max_attempts,
            initial_backoff: Duration::from_millis(config.router_backoff_ms),
        },
    ));

    let scorer = Arc::new(GeminiScorer::new(config.scorer_api_key.clone()));

    let match_resolver = Arc::new(ProductMatchResolver::new(
        catalog_repo.clone(),
        scorer,
        config.high_confidence_threshold,
    ));

    let catalog_sync = Arc::new(CatalogSyncEngine::new(
        catalog_repo.clone(),
        router.clone(),
        ChronoDuration::hours(config.catalog_staleness_hours),
    ));

    let billing = Arc::new(BillingLedger::new(billing_repo.clone(), config.billing_grace_days));

    AppState {
        config: config.clone(),
        tenant_repo,
        catalog_repo,
        billing_repo,
        router,
        provisioner: Arc::new(DatabaseProvisioner::new()),
        match_resolver,
        catalog_sync,
        billing,
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/master_postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/master_sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
