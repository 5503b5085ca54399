use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError, new_id};
use fixerp_sql::{BatchStmt, Row, SQLError, SQLStore, Value};

use crate::model::{ItemFilter, PosLine, Sale, SaleFilter, SellItem};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sell_items (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        barcode TEXT UNIQUE,
        stock INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sell_items_category ON sell_items(category)",
    "CREATE TABLE IF NOT EXISTS sales (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        payment TEXT NOT NULL,
        cashier_id TEXT NOT NULL,
        customer_id TEXT,
        voided INTEGER NOT NULL DEFAULT 0,
        total INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sales_created ON sales(created_at)",
    "CREATE TABLE IF NOT EXISTS sale_items (
        id TEXT PRIMARY KEY,
        sale_id TEXT NOT NULL,
        item_id TEXT NOT NULL,
        name TEXT NOT NULL,
        qty INTEGER NOT NULL,
        unit_price INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sale_items_sale ON sale_items(sale_id)",
];

/// Persistent storage for sell items, sales and their line history.
///
/// The `stock` column on items is authoritative; checkout, void and
/// restock adjust it atomically and reads overlay it onto the document.
pub struct SellStore {
    db: Arc<dyn SQLStore>,
}

impl SellStore {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for ddl in SCHEMA {
            db.exec(ddl, &[])
                .map_err(|e| ServiceError::Storage(format!("sell schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    pub fn create_item(&self, item: &SellItem) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(item).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO sell_items (id, data, name, category, barcode, stock, active, \
                 created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                &[
                    Value::Text(item.id.clone()),
                    Value::Text(data),
                    Value::Text(item.name.clone()),
                    Value::Text(item.category.as_str().to_string()),
                    opt_text(&item.barcode),
                    Value::Integer(item.stock),
                    Value::Integer(item.active as i64),
                    Value::Text(item.created_at.clone()),
                    Value::Text(item.updated_at.clone()),
                ],
            )
            .map_err(map_barcode_constraint)?;

        Ok(())
    }

    pub fn get_item(&self, id: &str) -> Result<SellItem, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data, stock, updated_at FROM sell_items WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("sell item {id}")))?;

        row_to_item(row)
    }

    pub fn get_by_barcode(&self, barcode: &str) -> Result<SellItem, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data, stock, updated_at FROM sell_items WHERE barcode = ?1",
                &[Value::Text(barcode.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("item with barcode {barcode}")))?;

        row_to_item(row)
    }

    /// Replace the descriptive fields. Stock stays untouched; it only
    /// moves through checkout, void and restock.
    pub fn update_item(&self, item: &SellItem) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(item).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE sell_items SET data = ?1, name = ?2, category = ?3, barcode = ?4, \
                 active = ?5, updated_at = ?6 WHERE id = ?7",
                &[
                    Value::Text(data),
                    Value::Text(item.name.clone()),
                    Value::Text(item.category.as_str().to_string()),
                    opt_text(&item.barcode),
                    Value::Integer(item.active as i64),
                    Value::Text(item.updated_at.clone()),
                    Value::Text(item.id.clone()),
                ],
            )
            .map_err(map_barcode_constraint)?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("sell item {}", item.id)));
        }
        Ok(())
    }

    /// Delete an item. Refused while stock remains; past sales keep their
    /// own snapshots in `sale_items`.
    pub fn delete_item(&self, id: &str) -> Result<(), ServiceError> {
        let item = self.get_item(id)?;
        if item.stock != 0 {
            return Err(ServiceError::Conflict(format!(
                "item still has {} in stock",
                item.stock
            )));
        }

        self.db
            .exec(
                "DELETE FROM sell_items WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    pub fn list_items(
        &self,
        params: &ListParams,
        filter: &ItemFilter,
    ) -> Result<ListResult<SellItem>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(category) = filter.category {
            args.push(Value::Text(category.as_str().to_string()));
            conds.push(format!("category = ?{}", args.len()));
        }
        if let Some(active) = filter.active {
            args.push(Value::Integer(active as i64));
            conds.push(format!("active = ?{}", args.len()));
        }
        if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
            args.push(Value::Text(format!("%{}%", q.trim())));
            let n = args.len();
            conds.push(format!("(name LIKE ?{n} OR barcode LIKE ?{n})"));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM sell_items{where_clause}"),
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
                    "SELECT data, stock, updated_at FROM sell_items{where_clause} \
                     ORDER BY created_at DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Atomic stock increment for a delivery.
    pub fn restock(&self, id: &str, qty: i64, now: &str) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "UPDATE sell_items SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
                &[
                    Value::Integer(qty),
                    Value::Text(now.to_string()),
                    Value::Text(id.to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("sell item {id}")));
        }
        Ok(())
    }

    /// Commit a checkout: the sale row, one `sale_items` row per line, and
    /// a guarded stock decrement per line, all in one transaction.
    pub fn checkout(&self, sale: &Sale) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(sale).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut stmts = Vec::with_capacity(1 + sale.lines.len() * 2);
        stmts.push(BatchStmt::new(
            "INSERT INTO sales (id, data, payment, cashier_id, customer_id, voided, total, \
             created_at) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
            vec![
                Value::Text(sale.id.clone()),
                Value::Text(data),
                Value::Text(sale.payment.as_str().to_string()),
                Value::Text(sale.cashier_id.clone()),
                opt_text(&sale.customer_id),
                Value::Integer(sale.total),
                Value::Text(sale.created_at.clone()),
            ],
        ));

        for line in &sale.lines {
            stmts.push(BatchStmt::new(
                "INSERT INTO sale_items (id, sale_id, item_id, name, qty, unit_price) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                vec![
                    Value::Text(new_id()),
                    Value::Text(sale.id.clone()),
                    Value::Text(line.item_id.clone()),
                    Value::Text(line.name.clone()),
                    Value::Integer(line.qty),
                    Value::Integer(line.unit_price),
                ],
            ));
            stmts.push(BatchStmt::guarded(
                "UPDATE sell_items SET stock = stock - ?1, updated_at = ?2 \
                 WHERE id = ?3 AND stock >= ?1",
                vec![
                    Value::Integer(line.qty),
                    Value::Text(sale.created_at.clone()),
                    Value::Text(line.item_id.clone()),
                ],
                format!("insufficient stock for '{}'", line.name),
            ));
        }

        self.db.exec_batch(&stmts).map_err(|e| match e {
            SQLError::Aborted(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other.to_string()),
        })?;

        Ok(())
    }

    pub fn get_sale(&self, id: &str) -> Result<Sale, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM sales WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("sale {id}")))?;

        row_to_sale(row)
    }

    /// The committed lines of a sale, from the `sale_items` history.
    pub fn sale_lines(&self, sale_id: &str) -> Result<Vec<PosLine>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT item_id, name, qty, unit_price FROM sale_items WHERE sale_id = ?1",
                &[Value::Text(sale_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            lines.push(PosLine {
                item_id: row
                    .get_str("item_id")
                    .ok_or_else(|| ServiceError::Storage("missing item_id".into()))?
                    .to_string(),
                name: row
                    .get_str("name")
                    .ok_or_else(|| ServiceError::Storage("missing name".into()))?
                    .to_string(),
                qty: row.get_i64("qty").unwrap_or(0),
                unit_price: row.get_i64("unit_price").unwrap_or(0),
            });
        }
        Ok(lines)
    }

    /// Void a sale: flag it (guarded against a second void) and put the
    /// stock back, one transaction.
    pub fn void_sale(&self, sale_id: &str, lines: &[PosLine], now: &str) -> Result<(), ServiceError> {
        let mut stmts = Vec::with_capacity(1 + lines.len());
        stmts.push(BatchStmt::guarded(
            "UPDATE sales SET voided = 1, \
             data = REPLACE(data, '\"voided\":false', '\"voided\":true') \
             WHERE id = ?1 AND voided = 0",
            vec![Value::Text(sale_id.to_string())],
            format!("sale {sale_id} already voided"),
        ));

        for line in lines {
            stmts.push(BatchStmt::guarded(
                "UPDATE sell_items SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
                vec![
                    Value::Integer(line.qty),
                    Value::Text(now.to_string()),
                    Value::Text(line.item_id.clone()),
                ],
                format!("item '{}' no longer exists", line.name),
            ));
        }

        self.db.exec_batch(&stmts).map_err(|e| match e {
            SQLError::Aborted(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other.to_string()),
        })?;

        Ok(())
    }

    pub fn list_sales(
        &self,
        params: &ListParams,
        filter: &SaleFilter,
    ) -> Result<ListResult<Sale>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(date) = &filter.date {
            args.push(Value::Text(format!("{date}%")));
            conds.push(format!("created_at LIKE ?{}", args.len()));
        }
        if let Some(payment) = filter.payment {
            args.push(Value::Text(payment.as_str().to_string()));
            conds.push(format!("payment = ?{}", args.len()));
        }
        if let Some(cashier_id) = &filter.cashier_id {
            args.push(Value::Text(cashier_id.clone()));
            conds.push(format!("cashier_id = ?{}", args.len()));
        }
        if let Some(voided) = filter.voided {
            args.push(Value::Integer(voided as i64));
            conds.push(format!("voided = ?{}", args.len()));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM sales{where_clause}"),
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
                    "SELECT data FROM sales{where_clause} \
                     ORDER BY created_at DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_sale)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Count and revenue for one calendar day, voided sales excluded.
    pub fn summary(&self, date: &str) -> Result<(i64, i64), ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT COUNT(*) as cnt, COALESCE(SUM(total), 0) as revenue FROM sales \
                 WHERE created_at LIKE ?1 AND voided = 0",
                &[Value::Text(format!("{date}%"))],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::Storage("empty aggregate".into()))?;
        Ok((
            row.get_i64("cnt").unwrap_or(0),
            row.get_i64("revenue").unwrap_or(0),
        ))
    }
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn map_barcode_constraint(e: SQLError) -> ServiceError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint") {
        ServiceError::Conflict("barcode already in use".into())
    } else {
        ServiceError::Storage(msg)
    }
}

/// Deserialize an item and overlay the authoritative columns.
fn row_to_item(row: &Row) -> Result<SellItem, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    let mut item: SellItem = serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad item json: {e}")))?;

    if let Some(stock) = row.get_i64("stock") {
        item.stock = stock;
    }
    if let Some(updated_at) = row.get_str("updated_at") {
        item.updated_at = updated_at.to_string();
    }
    Ok(item)
}

fn row_to_sale(row: &Row) -> Result<Sale, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad sale json: {e}")))
}
