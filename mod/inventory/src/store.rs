use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339};
use fixerp_sql::{BatchStmt, Row, SQLError, SQLStore, Value};

use crate::model::{
    Component, ComponentFilter, MovementFilter, MovementKind, StockLine, StockMovement,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS components (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT NOT NULL,
        quality TEXT NOT NULL,
        supplier_id TEXT,
        stock INTEGER NOT NULL DEFAULT 0,
        purchase_price INTEGER NOT NULL,
        low_stock_threshold INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_components_quality ON components(quality)",
    "CREATE INDEX IF NOT EXISTS idx_components_supplier ON components(supplier_id)",
    "CREATE TABLE IF NOT EXISTS stock_movements (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        component_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        batch_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_movements_component ON stock_movements(component_id)",
    "CREATE INDEX IF NOT EXISTS idx_movements_batch ON stock_movements(batch_id)",
];

/// Persistent storage for components and the stock ledger.
///
/// The `stock`, `purchase_price` and `updated_at` columns are authoritative:
/// batch commits move them without rewriting the JSON document, and reads
/// overlay them onto the deserialized component.
pub struct InventoryStore {
    db: Arc<dyn SQLStore>,
}

impl InventoryStore {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for ddl in SCHEMA {
            db.exec(ddl, &[])
                .map_err(|e| ServiceError::Storage(format!("inventory schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    pub fn create(&self, component: &Component) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(component).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO components (id, data, name, quality, supplier_id, stock, \
                 purchase_price, low_stock_threshold, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                &[
                    Value::Text(component.id.clone()),
                    Value::Text(data),
                    Value::Text(component.name.clone()),
                    Value::Text(component.quality.as_str().to_string()),
                    opt_text(&component.supplier_id),
                    Value::Integer(component.stock),
                    Value::Integer(component.purchase_price),
                    Value::Integer(component.low_stock_threshold),
                    Value::Text(component.created_at.clone()),
                    Value::Text(component.updated_at.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Component, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data, stock, purchase_price, updated_at FROM components WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("component {id}")))?;

        row_to_component(row)
    }

    /// Replace the descriptive fields of a component. Stock and purchase
    /// price stay untouched; they only move through batch commits.
    pub fn update(&self, component: &Component) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(component).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE components SET data = ?1, name = ?2, quality = ?3, supplier_id = ?4, \
                 low_stock_threshold = ?5, updated_at = ?6 WHERE id = ?7",
                &[
                    Value::Text(data),
                    Value::Text(component.name.clone()),
                    Value::Text(component.quality.as_str().to_string()),
                    opt_text(&component.supplier_id),
                    Value::Integer(component.low_stock_threshold),
                    Value::Text(component.updated_at.clone()),
                    Value::Text(component.id.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("component {}", component.id)));
        }
        Ok(())
    }

    /// Delete a component. Refused while any stock remains; the movement
    /// ledger keeps its own snapshots and survives the delete.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let component = self.get(id)?;
        if component.stock != 0 {
            return Err(ServiceError::Conflict(format!(
                "component still has {} in stock",
                component.stock
            )));
        }

        self.db
            .exec(
                "DELETE FROM components WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    pub fn list(
        &self,
        params: &ListParams,
        filter: &ComponentFilter,
    ) -> Result<ListResult<Component>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(quality) = filter.quality {
            args.push(Value::Text(quality.as_str().to_string()));
            conds.push(format!("quality = ?{}", args.len()));
        }
        if let Some(supplier_id) = &filter.supplier_id {
            args.push(Value::Text(supplier_id.clone()));
            conds.push(format!("supplier_id = ?{}", args.len()));
        }
        if let Some(model_id) = &filter.phone_model_id {
            // Ids are random hex, so a quoted LIKE over the JSON array is an
            // exact membership test.
            args.push(Value::Text(format!("%\"{model_id}\"%")));
            conds.push(format!("data LIKE ?{}", args.len()));
        }
        if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
            args.push(Value::Text(format!("%{}%", q.trim())));
            conds.push(format!("name LIKE ?{}", args.len()));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM components{where_clause}"),
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
                    "SELECT data, stock, purchase_price, updated_at FROM components\
                     {where_clause} ORDER BY created_at DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_component)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Components at or below their low-stock threshold, emptiest first.
    pub fn low_stock(&self) -> Result<Vec<Component>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data, stock, purchase_price, updated_at FROM components \
                 WHERE stock <= low_stock_threshold ORDER BY stock ASC",
                &[],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_component).collect()
    }

    /// Commit a stock-in: per line, add stock, take over the line price as
    /// the new purchase price and write an `IN` movement. One transaction,
    /// one shared batch id.
    pub fn commit_stock_in(
        &self,
        lines: &[StockLine],
        supplier_id: Option<&str>,
        note: Option<&str>,
    ) -> Result<String, ServiceError> {
        self.apply_movements(lines, MovementKind::In, supplier_id, note)
    }

    /// Commit a stock-out: per line, a guarded decrement (`stock >= qty`)
    /// and an `OUT` movement carrying the commit reason.
    pub fn commit_stock_out(
        &self,
        lines: &[StockLine],
        reason: Option<&str>,
    ) -> Result<String, ServiceError> {
        self.apply_movements(lines, MovementKind::Out, None, reason)
    }

    /// Guarded decrement for parts consumed by a repair ticket.
    pub fn consume_for_repair(
        &self,
        repair_id: &str,
        parts: &[StockLine],
    ) -> Result<String, ServiceError> {
        self.apply_movements(parts, MovementKind::Repair, Some(repair_id), None)
    }

    /// Compensating increment when repair consumption is undone.
    pub fn restock_for_repair(
        &self,
        repair_id: &str,
        parts: &[StockLine],
    ) -> Result<String, ServiceError> {
        self.apply_movements(parts, MovementKind::Void, Some(repair_id), None)
    }

    /// Build and run one transactional batch for a set of stock lines.
    ///
    /// Increments guard on the component existing; decrements guard on
    /// `stock >= qty`, so stock can never go negative. Each line also
    /// inserts its movement row inside the same transaction.
    fn apply_movements(
        &self,
        lines: &[StockLine],
        kind: MovementKind,
        ref_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<String, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::Validation("no stock lines".into()));
        }

        let batch_id = new_id();
        let now = now_rfc3339();
        let mut stmts = Vec::with_capacity(lines.len() * 2);

        for line in lines {
            if line.qty <= 0 {
                return Err(ServiceError::Validation(format!(
                    "qty must be positive for '{}'",
                    line.name
                )));
            }

            let update = match kind {
                MovementKind::In => BatchStmt::guarded(
                    "UPDATE components SET stock = stock + ?1, purchase_price = ?2, \
                     updated_at = ?3 WHERE id = ?4",
                    vec![
                        Value::Integer(line.qty),
                        Value::Integer(line.unit_price),
                        Value::Text(now.clone()),
                        Value::Text(line.component_id.clone()),
                    ],
                    format!("component {} not found", line.component_id),
                ),
                MovementKind::Void => BatchStmt::guarded(
                    "UPDATE components SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
                    vec![
                        Value::Integer(line.qty),
                        Value::Text(now.clone()),
                        Value::Text(line.component_id.clone()),
                    ],
                    format!("component {} not found", line.component_id),
                ),
                MovementKind::Out | MovementKind::Repair => BatchStmt::guarded(
                    "UPDATE components SET stock = stock - ?1, updated_at = ?2 \
                     WHERE id = ?3 AND stock >= ?1",
                    vec![
                        Value::Integer(line.qty),
                        Value::Text(now.clone()),
                        Value::Text(line.component_id.clone()),
                    ],
                    format!("insufficient stock for '{}'", line.name),
                ),
            };
            stmts.push(update);

            let movement = StockMovement {
                id: new_id(),
                component_id: line.component_id.clone(),
                kind,
                qty: line.qty,
                unit_price: line.unit_price,
                batch_id: batch_id.clone(),
                ref_id: ref_id.map(str::to_string),
                reason: reason.map(str::to_string),
                created_at: now.clone(),
            };
            let data = serde_json::to_string(&movement)
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            stmts.push(BatchStmt::new(
                "INSERT INTO stock_movements (id, data, component_id, kind, batch_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                vec![
                    Value::Text(movement.id.clone()),
                    Value::Text(data),
                    Value::Text(movement.component_id.clone()),
                    Value::Text(movement.kind.as_str().to_string()),
                    Value::Text(batch_id.clone()),
                    Value::Text(now.clone()),
                ],
            ));
        }

        self.db.exec_batch(&stmts).map_err(|e| match e {
            SQLError::Aborted(msg) if matches!(kind, MovementKind::Out | MovementKind::Repair) => {
                ServiceError::Conflict(msg)
            }
            SQLError::Aborted(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Storage(other.to_string()),
        })?;

        Ok(batch_id)
    }

    /// The movement ledger, newest first.
    pub fn movements(
        &self,
        params: &ListParams,
        filter: &MovementFilter,
    ) -> Result<ListResult<StockMovement>, ServiceError> {
        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(component_id) = &filter.component_id {
            args.push(Value::Text(component_id.clone()));
            conds.push(format!("component_id = ?{}", args.len()));
        }
        if let Some(kind) = filter.kind {
            args.push(Value::Text(kind.as_str().to_string()));
            conds.push(format!("kind = ?{}", args.len()));
        }
        if let Some(batch_id) = &filter.batch_id {
            args.push(Value::Text(batch_id.clone()));
            conds.push(format!("batch_id = ?{}", args.len()));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_rows = self
            .db
            .query(
                &format!("SELECT COUNT(*) as cnt FROM stock_movements{where_clause}"),
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
                    "SELECT data FROM stock_movements{where_clause} \
                     ORDER BY created_at DESC, id DESC LIMIT ?{limit_pos} OFFSET ?{}",
                    limit_pos + 1
                ),
                &args,
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_movement)
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

/// Deserialize a component and overlay the authoritative columns.
fn row_to_component(row: &Row) -> Result<Component, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    let mut component: Component = serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad component json: {e}")))?;

    if let Some(stock) = row.get_i64("stock") {
        component.stock = stock;
    }
    if let Some(price) = row.get_i64("purchase_price") {
        component.purchase_price = price;
    }
    if let Some(updated_at) = row.get_str("updated_at") {
        component.updated_at = updated_at.to_string();
    }
    Ok(component)
}

fn row_to_movement(row: &Row) -> Result<StockMovement, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad movement json: {e}")))
}

#[cfg(test)]
mod tests {
    use fixerp_core::{new_id, now_rfc3339};
    use fixerp_sql::SqliteStore;

    use super::*;
    use crate::model::Quality;

    fn test_store() -> InventoryStore {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        InventoryStore::new(db).unwrap()
    }

    fn make_component(name: &str, stock: i64) -> Component {
        let now = now_rfc3339();
        Component {
            id: new_id(),
            name: name.into(),
            quality: Quality::Oem,
            purchase_price: 10000,
            public_price: 18000,
            stock,
            low_stock_threshold: 2,
            supplier_id: None,
            phone_model_ids: vec![],
            note: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn line(component: &Component, qty: i64, unit_price: i64) -> StockLine {
        StockLine {
            component_id: component.id.clone(),
            name: component.name.clone(),
            qty,
            unit_price,
        }
    }

    #[test]
    fn stock_in_increments_and_records_movements() {
        let store = test_store();
        let screen = make_component("iPhone 12 屏幕", 0);
        let battery = make_component("iPhone 12 电池", 5);
        store.create(&screen).unwrap();
        store.create(&battery).unwrap();

        let batch = store
            .commit_stock_in(
                &[line(&screen, 10, 14000), line(&battery, 3, 6000)],
                Some("sup1"),
                None,
            )
            .unwrap();

        let screen = store.get(&screen.id).unwrap();
        assert_eq!(screen.stock, 10);
        assert_eq!(screen.purchase_price, 14000);
        assert_eq!(store.get(&battery.id).unwrap().stock, 8);

        let ledger = store
            .movements(
                &ListParams::default(),
                &MovementFilter {
                    batch_id: Some(batch),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(ledger.total, 2);
        assert!(ledger.items.iter().all(|m| m.kind == MovementKind::In));
        assert!(ledger.items.iter().all(|m| m.ref_id.as_deref() == Some("sup1")));
    }

    #[test]
    fn stock_out_guard_rolls_back_whole_batch() {
        let store = test_store();
        let screen = make_component("屏幕", 5);
        let battery = make_component("电池", 1);
        store.create(&screen).unwrap();
        store.create(&battery).unwrap();

        let err = store
            .commit_stock_out(&[line(&screen, 2, 14000), line(&battery, 3, 6000)], None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Nothing moved, nothing recorded.
        assert_eq!(store.get(&screen.id).unwrap().stock, 5);
        assert_eq!(store.get(&battery.id).unwrap().stock, 1);
        let ledger = store
            .movements(&ListParams::default(), &MovementFilter::default())
            .unwrap();
        assert_eq!(ledger.total, 0);
    }

    #[test]
    fn stock_in_to_unknown_component_is_not_found() {
        let store = test_store();
        let ghost = StockLine {
            component_id: "missing".into(),
            name: "鬼".into(),
            qty: 1,
            unit_price: 100,
        };
        let err = store.commit_stock_in(&[ghost], None, None).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn empty_commit_is_rejected() {
        let store = test_store();
        let err = store.commit_stock_in(&[], None, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn repair_consumption_and_restock() {
        let store = test_store();
        let screen = make_component("屏幕", 4);
        store.create(&screen).unwrap();

        store
            .consume_for_repair("rep1", &[line(&screen, 1, 14000)])
            .unwrap();
        assert_eq!(store.get(&screen.id).unwrap().stock, 3);

        store
            .restock_for_repair("rep1", &[line(&screen, 1, 14000)])
            .unwrap();
        assert_eq!(store.get(&screen.id).unwrap().stock, 4);

        let kinds: Vec<MovementKind> = store
            .movements(
                &ListParams::default(),
                &MovementFilter {
                    component_id: Some(screen.id.clone()),
                    ..Default::default()
                },
            )
            .unwrap()
            .items
            .iter()
            .map(|m| m.kind)
            .collect();
        assert!(kinds.contains(&MovementKind::Repair));
        assert!(kinds.contains(&MovementKind::Void));
    }

    #[test]
    fn low_stock_lists_only_low() {
        let store = test_store();
        let mut low = make_component("排线", 1);
        low.low_stock_threshold = 2;
        let mut fine = make_component("后盖", 9);
        fine.low_stock_threshold = 2;
        store.create(&low).unwrap();
        store.create(&fine).unwrap();

        let listed = store.low_stock().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, low.id);
    }

    #[test]
    fn list_filters_by_quality_and_model() {
        let store = test_store();
        let mut original = make_component("原装屏", 3);
        original.quality = Quality::Original;
        original.phone_model_ids = vec!["pm12".into()];
        let oem = make_component("国产屏", 3);
        store.create(&original).unwrap();
        store.create(&oem).unwrap();

        let by_quality = store
            .list(
                &ListParams::default(),
                &ComponentFilter {
                    quality: Some(Quality::Original),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(by_quality.total, 1);
        assert_eq!(by_quality.items[0].id, original.id);

        let by_model = store
            .list(
                &ListParams::default(),
                &ComponentFilter {
                    phone_model_id: Some("pm12".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(by_model.total, 1);
        assert_eq!(by_model.items[0].id, original.id);

        let by_name = store
            .list(
                &ListParams {
                    q: Some("国产".into()),
                    ..Default::default()
                },
                &ComponentFilter::default(),
            )
            .unwrap();
        assert_eq!(by_name.total, 1);
        assert_eq!(by_name.items[0].id, oem.id);
    }

    #[test]
    fn delete_with_stock_refused() {
        let store = test_store();
        let screen = make_component("屏幕", 2);
        store.create(&screen).unwrap();

        let err = store.delete(&screen.id).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        store
            .commit_stock_out(&[line(&screen, 2, 14000)], Some("整理"))
            .unwrap();
        store.delete(&screen.id).unwrap();
        assert!(store.get(&screen.id).is_err());
    }
}
