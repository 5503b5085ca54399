//! SQL schema for the auth module.

use fixerp_core::ServiceError;
use fixerp_sql::SQLStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        username TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
    "CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        user_id TEXT NOT NULL,
        revoked INTEGER NOT NULL DEFAULT 0,
        issued_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
];

/// Create the auth tables if they do not exist yet.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
