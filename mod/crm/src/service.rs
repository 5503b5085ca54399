use std::collections::HashMap;
use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError, merge_patch, new_id, now_rfc3339};
use fixerp_search::SearchEngine;
use fixerp_sql::SQLStore;

use crate::model::{CreateCustomer, Customer};
use crate::store::CustomerStore;

/// Name of the search collection customers are indexed into.
const COLLECTION: &str = "customers";

/// CRM service — customer records plus their search index.
pub struct CrmService {
    store: CustomerStore,
    search: Arc<dyn SearchEngine>,
}

impl CrmService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        search: Arc<dyn SearchEngine>,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = CustomerStore::new(sql)?;
        Ok(Arc::new(Self { store, search }))
    }

    pub fn create_customer(&self, input: CreateCustomer) -> Result<Customer, ServiceError> {
        let name = input.name.trim().to_string();
        let phone = input.phone.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if phone.is_empty() {
            return Err(ServiceError::Validation("phone must not be empty".into()));
        }

        let now = now_rfc3339();
        let customer = Customer {
            id: new_id(),
            name,
            phone,
            wechat: input.wechat,
            address: input.address,
            note: input.note,
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create(&customer)?;
        self.index_customer(&customer);
        Ok(customer)
    }

    pub fn get_customer(&self, id: &str) -> Result<Customer, ServiceError> {
        self.store.get(id)
    }

    pub fn get_by_phone(&self, phone: &str) -> Result<Customer, ServiceError> {
        self.store.get_by_phone(phone)
    }

    pub fn list_customers(&self, params: &ListParams) -> Result<ListResult<Customer>, ServiceError> {
        self.store.list(params)
    }

    /// Merge-patch a customer. Id and creation time are immutable.
    pub fn update_customer(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Customer, ServiceError> {
        let current = self.store.get(id)?;
        let mut base =
            serde_json::to_value(&current).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("id");
            obj.remove("createdAt");
            obj.insert("updatedAt".into(), serde_json::json!(now_rfc3339()));
        }
        merge_patch(&mut base, &patch);

        let updated: Customer =
            serde_json::from_value(base).map_err(|e| ServiceError::Validation(e.to_string()))?;
        if updated.name.trim().is_empty() || updated.phone.trim().is_empty() {
            return Err(ServiceError::Validation(
                "name and phone must not be empty".into(),
            ));
        }

        self.store.update(&updated)?;
        self.index_customer(&updated);
        Ok(updated)
    }

    /// Delete a customer. Historical repairs and sales keep their stored
    /// name snapshot, so they are left untouched.
    pub fn delete_customer(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(id)?;
        let _ = self.search.delete(COLLECTION, id);
        Ok(())
    }

    /// Full-text search over name / phone / wechat, hydrated from the store.
    pub fn search_customers(&self, query: &str, limit: usize) -> Result<Vec<Customer>, ServiceError> {
        let results = self
            .search
            .search(COLLECTION, query, limit)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut customers = Vec::new();
        for r in results {
            if let Ok(c) = self.store.get(&r.id) {
                customers.push(c);
            }
        }
        Ok(customers)
    }

    fn index_customer(&self, customer: &Customer) {
        let mut doc = HashMap::new();
        doc.insert("name".to_string(), customer.name.clone());
        doc.insert("phone".to_string(), customer.phone.clone());
        if let Some(ref wechat) = customer.wechat {
            doc.insert("wechat".to_string(), wechat.clone());
        }
        let _ = self.search.index(COLLECTION, &customer.id, doc);
    }
}

#[cfg(test)]
mod tests {
    use fixerp_search::TantivyEngine;
    use fixerp_sql::SqliteStore;

    use super::*;

    fn service() -> (Arc<CrmService>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let search = Arc::new(TantivyEngine::open(dir.path()).unwrap());
        (CrmService::new(sql, search).unwrap(), dir)
    }

    fn input(name: &str, phone: &str) -> CreateCustomer {
        CreateCustomer {
            name: name.into(),
            phone: phone.into(),
            wechat: None,
            address: None,
            note: None,
        }
    }

    #[test]
    fn search_finds_by_name_and_phone() {
        let (svc, _dir) = service();
        let zhang = svc.create_customer(input("张伟", "13800000001")).unwrap();
        svc.create_customer(input("李娜", "13900000002")).unwrap();

        let by_name = svc.search_customers("张伟", 10).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, zhang.id);

        let by_phone = svc.search_customers("13900000002", 10).unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "李娜");
    }

    #[test]
    fn patch_reindexes() {
        let (svc, _dir) = service();
        let c = svc.create_customer(input("张伟", "13800000001")).unwrap();

        svc.update_customer(&c.id, serde_json::json!({"name": "张伟强"}))
            .unwrap();

        let found = svc.search_customers("张伟强", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phone, "13800000001");
    }

    #[test]
    fn deleted_customer_drops_out_of_search() {
        let (svc, _dir) = service();
        let c = svc.create_customer(input("张伟", "13800000001")).unwrap();
        svc.delete_customer(&c.id).unwrap();

        assert!(svc.search_customers("张伟", 10).unwrap().is_empty());
        assert!(matches!(
            svc.get_customer(&c.id).unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[test]
    fn trims_input() {
        let (svc, _dir) = service();
        let c = svc
            .create_customer(input(" 张伟 ", " 13800000001 "))
            .unwrap();
        assert_eq!(c.name, "张伟");
        assert_eq!(c.phone, "13800000001");

        let found = svc.get_by_phone("13800000001").unwrap();
        assert_eq!(found.id, c.id);
    }
}
