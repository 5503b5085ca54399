use fixerp_core::{ServiceError, now_rfc3339};
use fixerp_sql::Value;

use crate::model::ShopSettings;

use super::CatalogService;

/// Fixed row id for the settings singleton.
const SETTINGS_ID: &str = "shop";

impl CatalogService {
    /// Fetch the shop settings, creating the default row on first access.
    pub fn get_settings(&self) -> Result<ShopSettings, ServiceError> {
        match self.get_record("settings", SETTINGS_ID) {
            Ok(settings) => Ok(settings),
            Err(ServiceError::NotFound(_)) => {
                let settings = ShopSettings {
                    name: String::new(),
                    phone: String::new(),
                    address: String::new(),
                    announcement: String::new(),
                    updated_at: now_rfc3339(),
                };
                self.insert_record(
                    "settings",
                    SETTINGS_ID,
                    &settings,
                    &[("updated_at", Value::Text(settings.updated_at.clone()))],
                )?;
                Ok(settings)
            }
            Err(e) => Err(e),
        }
    }

    /// Merge-patch the shop settings singleton.
    pub fn update_settings(&self, patch: serde_json::Value) -> Result<ShopSettings, ServiceError> {
        let current = self.get_settings()?;
        let updated: ShopSettings = Self::apply_patch(&current, patch)?;

        self.update_record(
            "settings",
            SETTINGS_ID,
            &updated,
            &[("updated_at", Value::Text(updated.updated_at.clone()))],
        )?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixerp_sql::SqliteStore;

    use crate::service::CatalogService;

    fn service() -> Arc<CatalogService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        CatalogService::new(sql).unwrap()
    }

    #[test]
    fn first_access_creates_default_row() {
        let svc = service();
        let settings = svc.get_settings().unwrap();
        assert!(settings.name.is_empty());

        // Second read returns the same row, not a fresh default.
        let again = svc.get_settings().unwrap();
        assert_eq!(settings.updated_at, again.updated_at);
    }

    #[test]
    fn patch_persists() {
        let svc = service();
        let updated = svc
            .update_settings(serde_json::json!({
                "name": "飞速手机维修",
                "announcement": "十一期间换屏九折"
            }))
            .unwrap();
        assert_eq!(updated.name, "飞速手机维修");

        let fetched = svc.get_settings().unwrap();
        assert_eq!(fetched.announcement, "十一期间换屏九折");
        assert!(fetched.phone.is_empty());
    }
}
