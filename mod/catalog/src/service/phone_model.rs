use fixerp_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339};
use fixerp_sql::Value;

use crate::model::{Brand, PhoneModel};

use super::CatalogService;

impl CatalogService {
    pub fn create_phone_model(
        &self,
        brand_id: String,
        name: String,
    ) -> Result<PhoneModel, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("model name must not be empty".into()));
        }
        // The brand must exist; the name only has to be unique within it.
        let _: Brand = self.get_record("brands", &brand_id)?;

        let now = now_rfc3339();
        let model = PhoneModel {
            id: new_id(),
            brand_id,
            name,
            created_at: now.clone(),
            updated_at: now,
        };

        self.insert_record(
            "phone_models",
            &model.id,
            &model,
            &[
                ("brand_id", Value::Text(model.brand_id.clone())),
                ("name", Value::Text(model.name.clone())),
                ("created_at", Value::Text(model.created_at.clone())),
                ("updated_at", Value::Text(model.updated_at.clone())),
            ],
        )?;

        Ok(model)
    }

    pub fn get_phone_model(&self, id: &str) -> Result<PhoneModel, ServiceError> {
        self.get_record("phone_models", id)
    }

    pub fn list_phone_models(
        &self,
        params: &ListParams,
        brand_id: Option<&str>,
    ) -> Result<ListResult<PhoneModel>, ServiceError> {
        let mut filters = Vec::new();
        if let Some(brand_id) = brand_id {
            filters.push(("brand_id", Value::Text(brand_id.to_string())));
        }
        self.list_records("phone_models", &filters, params.limit, params.offset)
    }

    pub fn update_phone_model(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<PhoneModel, ServiceError> {
        let current: PhoneModel = self.get_record("phone_models", id)?;
        let updated: PhoneModel = Self::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("model name must not be empty".into()));
        }
        if updated.brand_id != current.brand_id {
            let _: Brand = self.get_record("brands", &updated.brand_id)?;
        }

        self.update_record(
            "phone_models",
            id,
            &updated,
            &[
                ("brand_id", Value::Text(updated.brand_id.clone())),
                ("name", Value::Text(updated.name.clone())),
                ("updated_at", Value::Text(updated.updated_at.clone())),
            ],
        )?;

        Ok(updated)
    }

    /// Delete a phone model. Inventory rows that referenced it keep their
    /// stored snapshot of the name.
    pub fn delete_phone_model(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("phone_models", id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixerp_core::ListParams;
    use fixerp_sql::SqliteStore;

    use super::*;
    use crate::service::CatalogService;

    fn service() -> Arc<CatalogService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        CatalogService::new(sql).unwrap()
    }

    #[test]
    fn name_unique_per_brand_only() {
        let svc = service();
        let apple = svc.create_brand("Apple".into()).unwrap();
        let xiaomi = svc.create_brand("小米".into()).unwrap();

        svc.create_phone_model(apple.id.clone(), "Pro 12".into())
            .unwrap();
        // Same name under another brand is fine.
        svc.create_phone_model(xiaomi.id.clone(), "Pro 12".into())
            .unwrap();
        // Same name under the same brand is not.
        let err = svc
            .create_phone_model(apple.id.clone(), "Pro 12".into())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn unknown_brand_rejected() {
        let svc = service();
        let err = svc
            .create_phone_model("nope".into(), "iPhone 12".into())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn list_filters_by_brand() {
        let svc = service();
        let apple = svc.create_brand("Apple".into()).unwrap();
        let xiaomi = svc.create_brand("小米".into()).unwrap();
        svc.create_phone_model(apple.id.clone(), "iPhone 12".into())
            .unwrap();
        svc.create_phone_model(apple.id.clone(), "iPhone 13".into())
            .unwrap();
        svc.create_phone_model(xiaomi.id.clone(), "Redmi Note 9".into())
            .unwrap();

        let all = svc.list_phone_models(&ListParams::default(), None).unwrap();
        assert_eq!(all.total, 3);

        let apple_only = svc
            .list_phone_models(&ListParams::default(), Some(&apple.id))
            .unwrap();
        assert_eq!(apple_only.total, 2);
    }

    #[test]
    fn rename_via_patch() {
        let svc = service();
        let apple = svc.create_brand("Apple".into()).unwrap();
        let model = svc
            .create_phone_model(apple.id.clone(), "iPhone 12".into())
            .unwrap();

        let updated = svc
            .update_phone_model(&model.id, serde_json::json!({"name": "iPhone 12 Pro"}))
            .unwrap();
        assert_eq!(updated.name, "iPhone 12 Pro");
        assert_eq!(updated.brand_id, apple.id);

        let fetched = svc.get_phone_model(&model.id).unwrap();
        assert_eq!(fetched.name, "iPhone 12 Pro");
    }
}
