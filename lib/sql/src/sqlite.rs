use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::SQLError;
use crate::traits::{BatchStmt, Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::new();
                for (i, name) in column_names.iter().enumerate() {
                    let val = row_value_at(row, i);
                    columns.push((name.clone(), val));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }

    fn exec_batch(&self, stmts: &[BatchStmt]) -> Result<u64, SQLError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let mut total = 0u64;
        for stmt in stmts {
            let bound = bind_params(&stmt.params);
            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                bound.iter().map(|b| b.as_ref()).collect();

            let affected = tx
                .execute(&stmt.sql, param_refs.as_slice())
                .map_err(|e| SQLError::Execution(e.to_string()))?;

            if affected == 0 {
                if let Some(message) = &stmt.guard {
                    // Dropping the transaction rolls everything back.
                    return Err(SQLError::Aborted(message.clone()));
                }
            }
            total += affected as u64;
        }

        tx.commit()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        Ok(total)
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    // Try integer first, then real, then text, then blob, then null.
    if let Ok(i) = row.get::<_, i64>(idx) {
        return Value::Integer(i);
    }
    if let Ok(f) = row.get::<_, f64>(idx) {
        return Value::Real(f);
    }
    if let Ok(s) = row.get::<_, String>(idx) {
        return Value::Text(s);
    }
    if let Ok(b) = row.get::<_, Vec<u8>>(idx) {
        return Value::Blob(b);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_table(store: &SqliteStore) {
        store
            .exec(
                "CREATE TABLE stock (id TEXT PRIMARY KEY, name TEXT, qty INTEGER)",
                &[],
            )
            .unwrap();
        store
            .exec(
                "INSERT INTO stock (id, name, qty) VALUES (?1, ?2, ?3)",
                &[
                    Value::Text("scr-01".into()),
                    Value::Text("screen".into()),
                    Value::Integer(5),
                ],
            )
            .unwrap();
    }

    #[test]
    fn exec_and_query_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        stock_table(&store);

        let rows = store
            .query(
                "SELECT id, name, qty FROM stock WHERE id = ?1",
                &[Value::Text("scr-01".into())],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name"), Some("screen"));
        assert_eq!(rows[0].get_i64("qty"), Some(5));
        assert!(rows[0].get("missing").is_none());
    }

    #[test]
    fn exec_batch_commits_all_statements() {
        let store = SqliteStore::open_in_memory().unwrap();
        stock_table(&store);

        let total = store
            .exec_batch(&[
                BatchStmt::new(
                    "UPDATE stock SET qty = qty - ?1 WHERE id = ?2",
                    vec![Value::Integer(2), Value::Text("scr-01".into())],
                ),
                BatchStmt::new(
                    "INSERT INTO stock (id, name, qty) VALUES (?1, ?2, ?3)",
                    vec![
                        Value::Text("bat-01".into()),
                        Value::Text("battery".into()),
                        Value::Integer(9),
                    ],
                ),
            ])
            .unwrap();
        assert_eq!(total, 2);

        let rows = store.query("SELECT qty FROM stock WHERE id = 'scr-01'", &[]).unwrap();
        assert_eq!(rows[0].get_i64("qty"), Some(3));
        let rows = store.query("SELECT qty FROM stock WHERE id = 'bat-01'", &[]).unwrap();
        assert_eq!(rows[0].get_i64("qty"), Some(9));
    }

    #[test]
    fn failed_guard_rolls_back_everything() {
        let store = SqliteStore::open_in_memory().unwrap();
        stock_table(&store);

        let err = store
            .exec_batch(&[
                BatchStmt::new(
                    "UPDATE stock SET qty = qty - 1 WHERE id = 'scr-01'",
                    vec![],
                ),
                BatchStmt::guarded(
                    "UPDATE stock SET qty = qty - ?1 WHERE id = ?2 AND qty >= ?1",
                    vec![Value::Integer(99), Value::Text("scr-01".into())],
                    "not enough screens",
                ),
            ])
            .unwrap_err();

        match err {
            SQLError::Aborted(msg) => assert_eq!(msg, "not enough screens"),
            other => panic!("expected Aborted, got {other:?}"),
        }

        // First statement must have been rolled back too.
        let rows = store.query("SELECT qty FROM stock WHERE id = 'scr-01'", &[]).unwrap();
        assert_eq!(rows[0].get_i64("qty"), Some(5));
    }

    #[test]
    fn sql_error_rolls_back_everything() {
        let store = SqliteStore::open_in_memory().unwrap();
        stock_table(&store);

        let err = store.exec_batch(&[
            BatchStmt::new("UPDATE stock SET qty = 0 WHERE id = 'scr-01'", vec![]),
            BatchStmt::new("UPDATE no_such_table SET x = 1", vec![]),
        ]);
        assert!(err.is_err());

        let rows = store.query("SELECT qty FROM stock WHERE id = 'scr-01'", &[]).unwrap();
        assert_eq!(rows[0].get_i64("qty"), Some(5));
    }

    #[test]
    fn unguarded_zero_affected_is_fine() {
        let store = SqliteStore::open_in_memory().unwrap();
        stock_table(&store);

        let total = store
            .exec_batch(&[BatchStmt::new(
                "UPDATE stock SET qty = 1 WHERE id = 'missing'",
                vec![],
            )])
            .unwrap();
        assert_eq!(total, 0);
    }
}
