//! Server configuration loaded from a TOML context file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level server configuration.
///
/// Written by `fixerp context create`, read by the daemon at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub root: RootConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    /// Listen address. The `--listen` flag overrides it.
    #[serde(default)]
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    /// Argon2id PHC hash of the root password.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for redb, sqlite and the search indexes.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Signing secret shared with the auth module.
    pub secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

fn default_expire_secs() -> i64 {
    86400
}

impl ServerConfig {
    /// Resolve a context name to a config path.
    ///
    /// Anything that looks like a path (contains `/` or `.`) is taken
    /// verbatim; a bare name resolves to `/etc/fixerp/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/fixerp/{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }
}
