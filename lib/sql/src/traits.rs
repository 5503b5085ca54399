use crate::error::SQLError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a real column value by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            _ => None,
        }
    }
}

/// One statement in a transactional batch.
#[derive(Debug, Clone)]
pub struct BatchStmt {
    pub sql: String,
    pub params: Vec<Value>,

    /// When set, the statement must affect at least one row; otherwise the
    /// whole batch rolls back and the message surfaces as `SQLError::Aborted`.
    pub guard: Option<String>,
}

impl BatchStmt {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            guard: None,
        }
    }

    /// A statement that must affect at least one row.
    ///
    /// Used for conditional writes like `UPDATE ... SET stock = stock - ?
    /// WHERE id = ? AND stock >= ?` — zero affected rows means the
    /// precondition failed, not that there was nothing to do.
    pub fn guarded(
        sql: impl Into<String>,
        params: Vec<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sql: sql.into(),
            params,
            guard: Some(message.into()),
        }
    }
}

/// SQLStore provides a SQL execution interface backed by an embedded database.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute all statements inside a single transaction.
    ///
    /// Rolls back on the first error or failed guard and returns the total
    /// affected row count on commit. All-or-nothing: a guard failure leaves
    /// no partial writes behind.
    fn exec_batch(&self, stmts: &[BatchStmt]) -> Result<u64, SQLError>;
}
