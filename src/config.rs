use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub tenant_database_base: String,
    pub port: u16,
    pub scorer_api_key: String,
    pub high_confidence_threshold: f64,
    pub catalog_staleness_hours: i64,
    pub sync_interval_secs: u64,
    pub router_idle_ttl_secs: u64,
    pub router_max_attempts: u32,
    pub router_backoff_ms: u64,
    pub billing_grace_days: i64,
    pub sale_deadline_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            tenant_database_base: env::var("TENANT_DATABASE_BASE").unwrap_or_else(|_| "sqlite://./tenants".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            scorer_api_key: env::var("SCORER_API_KEY").unwrap_or_default(),
            high_confidence_threshold: env::var("HIGH_CONFIDENCE_THRESHOLD").unwrap_or_else(|_| "0.85".to_string()).parse().expect("HIGH_CONFIDENCE_THRESHOLD must be a number"),
            catalog_staleness_hours: env::var("CATALOG_STALENESS_HOURS").unwrap_or_else(|_| "24".to_string()).parse().expect("CATALOG_STALENESS_HOURS must be a number"),
            sync_interval_secs: env::var("SYNC_INTERVAL_SECS").unwrap_or_else(|_| "300".to_string()).parse().expect("SYNC_INTERVAL_SECS must be a number"),
            router_idle_ttl_secs: env::var("ROUTER_IDLE_TTL_SECS").unwrap_or_else(|_| "900".to_string()).parse().expect("ROUTER_IDLE_TTL_SECS must be a number"),
            router_max_attempts: env::var("ROUTER_MAX_ATTEMPTS").unwrap_or_else(|_| "3".to_string()).parse().expect("ROUTER_MAX_ATTEMPTS must be a number"),
            router_backoff_ms: env::var("ROUTER_BACKOFF_MS").unwrap_or_else(|_| "200".to_string()).parse().expect("ROUTER_BACKOFF_MS must be a number"),
            billing_grace_days: env::var("BILLING_GRACE_DAYS").unwrap_or_else(|_| "14".to_string()).parse().expect("BILLING_GRACE_DAYS must be a number"),
            sale_deadline_ms: env::var("SALE_DEADLINE_MS").unwrap_or_else(|_| "5000".to_string()).parse().expect("SALE_DEADLINE_MS must be a number"),
        }
    }

    // Tenant databases live next to each other under a common base: a directory
    // for SQLite deployments, a server root for Postgres.
    pub fn tenant_database_url(&self, subdomain: &str) -> String {
        let base = self.tenant_database_base.trim_end_matches('/');
        if base.starts_with("postgres://") || base.starts_with("postgresql://") {
            format!("{}/retail_store_{}", base, subdomain)
        } else {
            format!("{}/store_{}.db", base, subdomain)
        }
    }
}
