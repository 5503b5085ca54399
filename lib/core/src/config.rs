use std::path::PathBuf;

/// Storage layout shared by service binaries.
///
/// The server resolves every store path under one data directory unless an
/// explicit override is given, so a single `data_dir` setting is enough to
/// run a complete instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base directory for all persistent data.
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database holding staging carts.
    /// Defaults to `{data_dir}/staging.redb` if not specified.
    pub db_path: Option<PathBuf>,

    /// Path to the SQLite database.
    /// Defaults to `{data_dir}/data.sqlite` if not specified.
    pub sqlite_path: Option<PathBuf>,

    /// Directory for tantivy search indexes.
    /// Defaults to `{data_dir}/search/` if not specified.
    pub search_dir: Option<PathBuf>,

    /// Listen address for the HTTP server.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            sqlite_path: None,
            search_dir: None,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve the redb database path, falling back to `{data_dir}/staging.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("staging.redb"))
    }

    /// Resolve the SQLite database path, falling back to `{data_dir}/data.sqlite`.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("data.sqlite"))
    }

    /// Resolve the search index directory.
    pub fn resolve_search_dir(&self) -> PathBuf {
        self.search_dir
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("search"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/data/staging.redb"));
        assert_eq!(
            config.resolve_sqlite_path(),
            PathBuf::from("/data/data.sqlite")
        );
        assert_eq!(config.resolve_search_dir(), PathBuf::from("/data/search"));
    }

    #[test]
    fn test_explicit_override_wins() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            sqlite_path: Some(PathBuf::from("/elsewhere/shop.sqlite")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_sqlite_path(),
            PathBuf::from("/elsewhere/shop.sqlite")
        );
        assert_eq!(config.resolve_db_path(), PathBuf::from("/data/staging.redb"));
    }
}
