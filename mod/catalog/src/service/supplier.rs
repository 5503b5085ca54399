use fixerp_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339};
use fixerp_sql::Value;

use crate::model::Supplier;

use super::CatalogService;

/// Input for creating a supplier.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CatalogService {
    pub fn create_supplier(&self, input: CreateSupplier) -> Result<Supplier, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "supplier name must not be empty".into(),
            ));
        }

        let now = now_rfc3339();
        let supplier = Supplier {
            id: new_id(),
            name,
            contact: input.contact,
            phone: input.phone,
            address: input.address,
            note: input.note,
            created_at: now.clone(),
            updated_at: now,
        };

        self.insert_record(
            "suppliers",
            &supplier.id,
            &supplier,
            &[
                ("name", Value::Text(supplier.name.clone())),
                ("created_at", Value::Text(supplier.created_at.clone())),
                ("updated_at", Value::Text(supplier.updated_at.clone())),
            ],
        )?;

        Ok(supplier)
    }

    pub fn get_supplier(&self, id: &str) -> Result<Supplier, ServiceError> {
        self.get_record("suppliers", id)
    }

    pub fn list_suppliers(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<Supplier>, ServiceError> {
        self.list_records("suppliers", &[], params.limit, params.offset)
    }

    pub fn update_supplier(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Supplier, ServiceError> {
        let current: Supplier = self.get_record("suppliers", id)?;
        let updated: Supplier = Self::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "supplier name must not be empty".into(),
            ));
        }

        self.update_record(
            "suppliers",
            id,
            &updated,
            &[
                ("name", Value::Text(updated.name.clone())),
                ("updated_at", Value::Text(updated.updated_at.clone())),
            ],
        )?;

        Ok(updated)
    }

    /// Delete a supplier. Stock-in history keeps the stored snapshot.
    pub fn delete_supplier(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("suppliers", id)
    }
}
