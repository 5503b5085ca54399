use fixerp_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339};
use fixerp_sql::Value;

use crate::model::Brand;

use super::CatalogService;

impl CatalogService {
    pub fn create_brand(&self, name: String) -> Result<Brand, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("brand name must not be empty".into()));
        }

        let now = now_rfc3339();
        let brand = Brand {
            id: new_id(),
            name,
            created_at: now.clone(),
            updated_at: now,
        };

        self.insert_record(
            "brands",
            &brand.id,
            &brand,
            &[
                ("name", Value::Text(brand.name.clone())),
                ("created_at", Value::Text(brand.created_at.clone())),
                ("updated_at", Value::Text(brand.updated_at.clone())),
            ],
        )?;

        Ok(brand)
    }

    pub fn get_brand(&self, id: &str) -> Result<Brand, ServiceError> {
        self.get_record("brands", id)
    }

    pub fn list_brands(&self, params: &ListParams) -> Result<ListResult<Brand>, ServiceError> {
        self.list_records("brands", &[], params.limit, params.offset)
    }

    pub fn update_brand(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Brand, ServiceError> {
        let current: Brand = self.get_record("brands", id)?;
        let updated: Brand = Self::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("brand name must not be empty".into()));
        }

        self.update_record(
            "brands",
            id,
            &updated,
            &[
                ("name", Value::Text(updated.name.clone())),
                ("updated_at", Value::Text(updated.updated_at.clone())),
            ],
        )?;

        Ok(updated)
    }

    /// Delete a brand. Refused while phone models still point at it.
    pub fn delete_brand(&self, id: &str) -> Result<(), ServiceError> {
        let models = self.count_records("phone_models", &[("brand_id", Value::Text(id.to_string()))])?;
        if models > 0 {
            return Err(ServiceError::Conflict(format!(
                "brand still has {} phone models",
                models
            )));
        }
        self.delete_record("brands", id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixerp_sql::SqliteStore;

    use super::*;
    use crate::service::CatalogService;

    fn service() -> Arc<CatalogService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        CatalogService::new(sql).unwrap()
    }

    #[test]
    fn create_list_delete() {
        let svc = service();
        let apple = svc.create_brand("Apple".into()).unwrap();
        svc.create_brand("小米".into()).unwrap();

        let result = svc.list_brands(&ListParams::default()).unwrap();
        assert_eq!(result.total, 2);

        svc.delete_brand(&apple.id).unwrap();
        let result = svc.list_brands(&ListParams::default()).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "小米");
    }

    #[test]
    fn duplicate_name_conflicts() {
        let svc = service();
        svc.create_brand("Apple".into()).unwrap();
        let err = svc.create_brand("Apple".into()).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn rename_to_taken_name_conflicts() {
        let svc = service();
        svc.create_brand("Apple".into()).unwrap();
        let huawei = svc.create_brand("华为".into()).unwrap();

        let err = svc
            .update_brand(&huawei.id, serde_json::json!({"name": "Apple"}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn delete_with_models_refused() {
        let svc = service();
        let apple = svc.create_brand("Apple".into()).unwrap();
        svc.create_phone_model(apple.id.clone(), "iPhone 12".into())
            .unwrap();

        let err = svc.delete_brand(&apple.id).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
