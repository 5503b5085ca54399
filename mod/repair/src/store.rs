use std::collections::HashMap;
use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError};
use fixerp_sql::{BatchStmt, Row, SQLError, SQLStore, Value};

use crate::model::{Repair, RepairFilter, RepairStatus, Warranty};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS repairs (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        customer_id TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        phone TEXT NOT NULL,
        imei TEXT,
        status TEXT NOT NULL,
        technician_id TEXT,
        fault TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_repairs_status ON repairs(status)",
    "CREATE INDEX IF NOT EXISTS idx_repairs_customer ON repairs(customer_id)",
    "CREATE TABLE IF NOT EXISTS warranties (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        repair_id TEXT NOT NULL UNIQUE,
        customer_id TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_warranties_customer ON warranties(customer_id)",
];

/// Persistent storage for repair tickets and warranties.
///
/// Every ticket write is compare-and-swap on the status column, so two
/// clerks acting on the same ticket cannot silently overwrite each other.
pub struct RepairStore {
    db: Arc<dyn SQLStore>,
}

impl RepairStore {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for ddl in SCHEMA {
            db.exec(ddl, &[])
                .map_err(|e| ServiceError::Storage(format!("repair schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    pub fn create(&self, repair: &Repair) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(repair).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO repairs (id, data, customer_id, customer_name, phone, imei, \
                 status, technician_id, fault, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                &[
                    Value::Text(repair.id.clone()),
                    Value::Text(data),
                    Value::Text(repair.customer_id.clone()),
                    Value::Text(repair.customer_name.clone()),
                    Value::Text(repair.phone.clone()),
                    opt_text(&repair.imei),
                    Value::Text(repair.status.as_str().to_string()),
                    opt_text(&repair.technician_id),
                    Value::Text(repair.fault.clone()),
                    Value::Text(repair.created_at.clone()),
                    Value::Text(repair.updated_at.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Repair, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM repairs WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("repair {id}")))?;

        row_to_repair(row)
    }

    /// Write the full ticket, guarded on the status it was read at.
    /// Zero affected rows means the status moved underneath the caller.
    pub fn update_cas(&self, repair: &Repair, expected: RepairStatus) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(repair).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE repairs SET data = ?1, status = ?2, technician_id = ?3, fault = ?4, \
                 updated_at = ?5 WHERE id = ?6 AND status = ?7",
                &[
                    Value::Text(data),
                    Value::Text(repair.status.as_str().to_string()),
                    opt_text(&repair.technician_id),
                    Value::Text(repair.fault.clone()),
                    Value::Text(repair.updated_at.clone()),
                    Value::Text(repair.id.clone()),
                    Value::Text(expected.as_str().to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "repair {} is no longer {}",
                repair.id,
                expected.as_str()
            )));
        }
        Ok(())
    }

    /// Pickup: one transaction writes the status (CAS on REPAIRED) and the
    /// warranty row. OR IGNORE keeps the original warranty clock when a
    /// reworked repair is picked up again.
    pub fn pickup_with_warranty(
        &self,
        repair: &Repair,
        warranty: &Warranty,
    ) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(repair).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let warranty_data =
            serde_json::to_string(warranty).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let stmts = [
            BatchStmt::guarded(
                "UPDATE repairs SET data = ?1, status = ?2, technician_id = ?3, fault = ?4, \
                 updated_at = ?5 WHERE id = ?6 AND status = ?7",
                vec![
                    Value::Text(data),
                    Value::Text(repair.status.as_str().to_string()),
                    opt_text(&repair.technician_id),
                    Value::Text(repair.fault.clone()),
                    Value::Text(repair.updated_at.clone()),
                    Value::Text(repair.id.clone()),
                    Value::Text(RepairStatus::Repaired.as_str().to_string()),
                ],
                format!("repair {} is no longer REPAIRED", repair.id),
            ),
            BatchStmt::new(
                "INSERT OR IGNORE INTO warranties (id, data, repair_id, customer_id, \
                 expires_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                vec![
                    Value::Text(warranty.id.clone()),
                    Value::Text(warranty_data),
                    Value::Text(warranty.repair_id.clone()),
                    Value::Text(warranty.customer_id.clone()),
                    Value::Text(warranty.expires_at.clone()),
                    Value::Text(warranty.created_at.clone()),
                ],
            ),
        ];

        self.db.exec_batch(&stmts).map_err(|e| match e {
            SQLError::Aborted(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other.to_string()),
        })?;

        Ok(())
    }

    pub fn list(
        &self,
        params: &ListParams,
        filter: &RepairFilter,
    ) -> Result<ListResult<Repair>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            args.push(Value::Text(status.as_str().to_string()));
            conds.push(format!("status = ?{}", args.len()));
        }
        if let Some(customer_id) = &filter.customer_id {
            args.push(Value::Text(customer_id.clone()));
            conds.push(format!("customer_id = ?{}", args.len()));
        }
        if let Some(technician_id) = &filter.technician_id {
            args.push(Value::Text(technician_id.clone()));
            conds.push(format!("technician_id = ?{}", args.len()));
        }
        if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
            args.push(Value::Text(format!("%{}%", q.trim())));
            let n = args.len();
            conds.push(format!(
                "(fault LIKE ?{n} OR customer_name LIKE ?{n} OR imei LIKE ?{n})"
            ));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM repairs{where_clause}"),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        args.push(Value::Integer(params.limit as i64));
        let limit_pos = args.len();
        args.push(Value::Integer(params.offset as i64));
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT data FROM repairs{where_clause} \
                     ORDER BY created_at DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_repair)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Ticket counts grouped by status. Statuses with no tickets are absent.
    pub fn stats(&self) -> Result<HashMap<String, i64>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT status, COUNT(*) as cnt FROM repairs GROUP BY status",
                &[],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut counts = HashMap::new();
        for row in rows {
            if let (Some(status), Some(cnt)) = (row.get_str("status"), row.get_i64("cnt")) {
                counts.insert(status.to_string(), cnt);
            }
        }
        Ok(counts)
    }

    pub fn get_warranty(&self, id: &str) -> Result<Warranty, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM warranties WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("warranty {id}")))?;

        row_to_warranty(row)
    }

    pub fn warranty_for_repair(&self, repair_id: &str) -> Result<Warranty, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM warranties WHERE repair_id = ?1",
                &[Value::Text(repair_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows.first().ok_or_else(|| {
            ServiceError::NotFound(format!("no warranty for repair {repair_id}"))
        })?;

        row_to_warranty(row)
    }

    pub fn list_warranties(
        &self,
        params: &ListParams,
        customer_id: Option<&str>,
    ) -> Result<ListResult<Warranty>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(customer_id) = customer_id {
            args.push(Value::Text(customer_id.to_string()));
            conds.push(format!("customer_id = ?{}", args.len()));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM warranties{where_clause}"),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        args.push(Value::Integer(params.limit as i64));
        let limit_pos = args.len();
        args.push(Value::Integer(params.offset as i64));
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT data FROM warranties{where_clause} \
                     ORDER BY created_at DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_warranty)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn row_to_repair(row: &Row) -> Result<Repair, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad repair json: {e}")))
}

fn row_to_warranty(row: &Row) -> Result<Warranty, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad warranty json: {e}")))
}
