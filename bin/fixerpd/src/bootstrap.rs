//! First-start checks.
//!
//! The daemon refuses to start on a config without a root password hash or
//! JWT secret, and seeds the shop settings row so the first `GET` after
//! install does not race two creators.

use fixerp_catalog::service::CatalogService;
use tracing::info;

use crate::config::ServerConfig;

/// Verify the configuration is ready to serve.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.root.password_hash.is_empty() {
        anyhow::bail!(
            "no root password hash in configuration.\n\
             Run `fixerp context create <name>` to set up the server first."
        );
    }
    if !config.root.password_hash.starts_with("$argon2") {
        anyhow::bail!("root password hash is not an argon2 PHC string");
    }
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("storage data_dir is empty in configuration");
    }
    Ok(())
}

/// Make sure the shop settings singleton exists.
pub fn ensure_settings(catalog: &CatalogService) -> anyhow::Result<()> {
    let settings = catalog
        .get_settings()
        .map_err(|e| anyhow::anyhow!("failed to seed shop settings: {e}"))?;
    if settings.name.is_empty() {
        info!("shop settings not filled in yet; set them via PATCH /catalog/settings");
    }
    Ok(())
}

/// Verify a root login attempt against the configured argon2id hash.
pub fn verify_root_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
