use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError};
use fixerp_sql::{Row, SQLStore, Value};

use crate::model::Customer;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT NOT NULL,
        phone TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(name)",
];

/// Persistent storage for customers, backed by SQLStore (SQLite).
pub struct CustomerStore {
    db: Arc<dyn SQLStore>,
}

impl CustomerStore {
    /// Create a new CustomerStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for ddl in SCHEMA {
            db.exec(ddl, &[])
                .map_err(|e| ServiceError::Storage(format!("crm schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    /// Insert a new customer. A taken phone number is a conflict.
    pub fn create(&self, customer: &Customer) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(customer).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO customers (id, data, name, phone, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(customer.id.clone()),
                    Value::Text(data),
                    Value::Text(customer.name.clone()),
                    Value::Text(customer.phone.clone()),
                    Value::Text(customer.created_at.clone()),
                    Value::Text(customer.updated_at.clone()),
                ],
            )
            .map_err(map_constraint)?;

        Ok(())
    }

    /// Get a customer by ID.
    pub fn get(&self, id: &str) -> Result<Customer, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM customers WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("customer {id}")))?;

        row_to_customer(row)
    }

    /// Exact phone lookup.
    pub fn get_by_phone(&self, phone: &str) -> Result<Customer, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM customers WHERE phone = ?1",
                &[Value::Text(phone.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("customer with phone {phone}")))?;

        row_to_customer(row)
    }

    /// Full replacement of the data column + indexed columns.
    pub fn update(&self, customer: &Customer) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(customer).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE customers SET data = ?1, name = ?2, phone = ?3, updated_at = ?4 \
                 WHERE id = ?5",
                &[
                    Value::Text(data),
                    Value::Text(customer.name.clone()),
                    Value::Text(customer.phone.clone()),
                    Value::Text(customer.updated_at.clone()),
                    Value::Text(customer.id.clone()),
                ],
            )
            .map_err(map_constraint)?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("customer {}", customer.id)));
        }
        Ok(())
    }

    /// Delete a customer by ID.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "DELETE FROM customers WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("customer {id}")));
        }
        Ok(())
    }

    /// List customers, newest first.
    pub fn list(&self, params: &ListParams) -> Result<ListResult<Customer>, ServiceError> {
        let count_rows = self
            .db
            .query("SELECT COUNT(*) as cnt FROM customers", &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let rows = self
            .db
            .query(
                "SELECT data FROM customers ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                &[
                    Value::Integer(params.limit as i64),
                    Value::Integer(params.offset as i64),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_customer)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }
}

fn map_constraint(e: fixerp_sql::SQLError) -> ServiceError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint") {
        ServiceError::Conflict("phone number already registered".into())
    } else {
        ServiceError::Storage(msg)
    }
}

/// Deserialize a Customer from a row's `data` JSON column.
fn row_to_customer(row: &Row) -> Result<Customer, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad customer json: {e}")))
}

#[cfg(test)]
mod tests {
    use fixerp_core::{new_id, now_rfc3339};
    use fixerp_sql::SqliteStore;

    use super::*;

    fn test_store() -> CustomerStore {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        CustomerStore::new(db).unwrap()
    }

    fn make_customer(name: &str, phone: &str) -> Customer {
        let now = now_rfc3339();
        Customer {
            id: new_id(),
            name: name.into(),
            phone: phone.into(),
            wechat: None,
            address: None,
            note: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn create_and_lookup_by_phone() {
        let store = test_store();
        let c = make_customer("张伟", "13800000001");
        store.create(&c).unwrap();

        let got = store.get_by_phone("13800000001").unwrap();
        assert_eq!(got.id, c.id);
        assert_eq!(got.name, "张伟");
    }

    #[test]
    fn duplicate_phone_conflicts() {
        let store = test_store();
        store.create(&make_customer("张伟", "13800000001")).unwrap();

        let err = store
            .create(&make_customer("李娜", "13800000001"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn update_to_taken_phone_conflicts() {
        let store = test_store();
        store.create(&make_customer("张伟", "13800000001")).unwrap();
        let mut c2 = make_customer("李娜", "13900000002");
        store.create(&c2).unwrap();

        c2.phone = "13800000001".into();
        let err = store.update(&c2).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn delete_then_missing() {
        let store = test_store();
        let c = make_customer("张伟", "13800000001");
        store.create(&c).unwrap();
        store.delete(&c.id).unwrap();

        assert!(store.get(&c.id).is_err());
        assert!(store.delete(&c.id).is_err());
    }

    #[test]
    fn list_counts_total() {
        let store = test_store();
        for i in 0..3 {
            store
                .create(&make_customer("客户", &format!("1380000000{i}")))
                .unwrap();
        }

        let result = store
            .list(&ListParams {
                limit: 2,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.items.len(), 2);
    }
}
