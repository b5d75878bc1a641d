use crate::error::AppError;

pub mod sqlite_tenant_repo;
pub mod sqlite_catalog_repo;
pub mod sqlite_billing_repo;
pub mod sqlite_inventory_repo;

pub mod postgres_tenant_repo;
pub mod postgres_catalog_repo;
pub mod postgres_billing_repo;
pub mod postgres_inventory_repo;

// Unique-constraint violations are how read-then-write races surface; callers
// that resolve them (subdomain takeover, SKU creation, duplicate active
// subscription) need a Conflict they can match on rather than a raw DB error.
pub(crate) fn conflict_on_unique(e: sqlx::Error, msg: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(msg.to_string()),
        _ => AppError::Database(e),
    }
}
