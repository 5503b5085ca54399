//! SQL schema for the catalog module.

use fixerp_core::ServiceError;
use fixerp_sql::SQLStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS brands (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS phone_models (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        brand_id TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(brand_id, name)
    )",
    "CREATE INDEX IF NOT EXISTS idx_phone_models_brand ON phone_models(brand_id)",
    "CREATE TABLE IF NOT EXISTS suppliers (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS settings (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Create the catalog tables if they do not exist yet.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
