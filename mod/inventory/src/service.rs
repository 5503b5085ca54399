use std::collections::HashMap;
use std::sync::Arc;

use fixerp_core::{ListParams, ListResult, ServiceError, merge_patch, new_id, now_rfc3339};
use fixerp_kv::KVStore;
use fixerp_search::SearchEngine;
use fixerp_sql::SQLStore;
use fixerp_staging::StagingCart;

use crate::model::{
    CommitResult, Component, ComponentFilter, CreateComponent, LineInput, MovementFilter,
    StockLine, StockMovement,
};
use crate::store::InventoryStore;

/// Name of the search collection components are indexed into.
const COLLECTION: &str = "components";

/// Which staging cart an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartKind {
    StockIn,
    StockOut,
}

/// Inventory service: components, their search index, and the stock-in /
/// stock-out staging carts.
pub struct InventoryService {
    store: InventoryStore,
    search: Arc<dyn SearchEngine>,
    stockin: StagingCart<StockLine>,
    stockout: StagingCart<StockLine>,
}

impl InventoryService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        search: Arc<dyn SearchEngine>,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = InventoryStore::new(sql)?;
        Ok(Arc::new(Self {
            store,
            search,
            stockin: StagingCart::new(kv.clone(), "stockin"),
            stockout: StagingCart::new(kv, "stockout"),
        }))
    }

    pub fn create_component(&self, input: CreateComponent) -> Result<Component, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if input.purchase_price < 0 || input.public_price < 0 {
            return Err(ServiceError::Validation("price must not be negative".into()));
        }
        if input.low_stock_threshold < 0 {
            return Err(ServiceError::Validation(
                "lowStockThreshold must not be negative".into(),
            ));
        }

        let now = now_rfc3339();
        let component = Component {
            id: new_id(),
            name,
            quality: input.quality,
            purchase_price: input.purchase_price,
            public_price: input.public_price,
            stock: 0,
            low_stock_threshold: input.low_stock_threshold,
            supplier_id: input.supplier_id,
            phone_model_ids: input.phone_model_ids,
            note: input.note,
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create(&component)?;
        self.index_component(&component);
        Ok(component)
    }

    pub fn get_component(&self, id: &str) -> Result<Component, ServiceError> {
        self.store.get(id)
    }

    pub fn list_components(
        &self,
        params: &ListParams,
        filter: &ComponentFilter,
    ) -> Result<ListResult<Component>, ServiceError> {
        self.store.list(params, filter)
    }

    pub fn low_stock(&self) -> Result<Vec<Component>, ServiceError> {
        self.store.low_stock()
    }

    /// Merge-patch a component. Stock and purchase price cannot be patched;
    /// they only move through commits.
    pub fn update_component(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Component, ServiceError> {
        let current = self.store.get(id)?;
        let mut base =
            serde_json::to_value(&current).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("id");
            obj.remove("createdAt");
            obj.remove("stock");
            obj.remove("purchasePrice");
            obj.insert("updatedAt".into(), serde_json::json!(now_rfc3339()));
        }
        merge_patch(&mut base, &patch);

        let updated: Component = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {e}")))?;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if updated.public_price < 0 {
            return Err(ServiceError::Validation("price must not be negative".into()));
        }

        self.store.update(&updated)?;
        self.index_component(&updated);
        Ok(updated)
    }

    pub fn delete_component(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(id)?;
        let _ = self.search.delete(COLLECTION, id);
        Ok(())
    }

    /// Full-text search over component names and notes.
    pub fn search_components(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Component>, ServiceError> {
        let hits = self
            .search
            .search(COLLECTION, query, limit)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Ok(component) = self.store.get(&hit.id) {
                items.push(component);
            }
        }
        Ok(items)
    }

    fn cart(&self, kind: CartKind) -> &StagingCart<StockLine> {
        match kind {
            CartKind::StockIn => &self.stockin,
            CartKind::StockOut => &self.stockout,
        }
    }

    /// Put a line into a cart. An existing line for the same component
    /// merges (quantities add, price takes the latest value).
    pub fn put_line(
        &self,
        kind: CartKind,
        cart_id: &str,
        input: LineInput,
    ) -> Result<StockLine, ServiceError> {
        if input.qty <= 0 {
            return Err(ServiceError::Validation("qty must be positive".into()));
        }
        let component = self.store.get(&input.component_id)?;

        let line = StockLine {
            component_id: component.id,
            name: component.name,
            qty: input.qty,
            unit_price: input.unit_price.unwrap_or(component.purchase_price),
        };
        self.cart(kind).upsert_line(cart_id, line)
    }

    pub fn lines(&self, kind: CartKind, cart_id: &str) -> Result<Vec<StockLine>, ServiceError> {
        self.cart(kind).lines(cart_id)
    }

    pub fn remove_line(
        &self,
        kind: CartKind,
        cart_id: &str,
        component_id: &str,
    ) -> Result<(), ServiceError> {
        self.cart(kind).remove_line(cart_id, component_id)
    }

    /// Drop a whole cart. Returns the number of lines removed.
    pub fn clear_cart(&self, kind: CartKind, cart_id: &str) -> Result<usize, ServiceError> {
        self.cart(kind).clear(cart_id)
    }

    /// Commit a stock-in cart. The cart is cleared only after the batch
    /// lands, so a failed commit leaves it intact.
    pub fn commit_stockin(
        &self,
        cart_id: &str,
        supplier_id: Option<&str>,
        note: Option<&str>,
    ) -> Result<CommitResult, ServiceError> {
        let lines = self.stockin.lines(cart_id)?;
        if lines.is_empty() {
            return Err(ServiceError::Validation(format!("cart '{cart_id}' is empty")));
        }

        let batch_id = self.store.commit_stock_in(&lines, supplier_id, note)?;
        self.stockin.clear(cart_id)?;
        Ok(CommitResult {
            batch_id,
            lines: lines.len(),
        })
    }

    /// Commit a stock-out cart. Insufficient stock aborts the whole batch
    /// and leaves the cart untouched.
    pub fn commit_stockout(
        &self,
        cart_id: &str,
        reason: Option<&str>,
    ) -> Result<CommitResult, ServiceError> {
        let lines = self.stockout.lines(cart_id)?;
        if lines.is_empty() {
            return Err(ServiceError::Validation(format!("cart '{cart_id}' is empty")));
        }

        let batch_id = self.store.commit_stock_out(&lines, reason)?;
        self.stockout.clear(cart_id)?;
        Ok(CommitResult {
            batch_id,
            lines: lines.len(),
        })
    }

    pub fn movements(
        &self,
        params: &ListParams,
        filter: &MovementFilter,
    ) -> Result<ListResult<StockMovement>, ServiceError> {
        self.store.movements(params, filter)
    }

    /// Take parts out of stock for a repair ticket. Used by the repair
    /// module, not exposed over HTTP.
    pub fn consume_for_repair(
        &self,
        repair_id: &str,
        parts: &[StockLine],
    ) -> Result<String, ServiceError> {
        self.store.consume_for_repair(repair_id, parts)
    }

    /// Put consumed parts back when a repair unwinds.
    pub fn restock_for_repair(
        &self,
        repair_id: &str,
        parts: &[StockLine],
    ) -> Result<String, ServiceError> {
        self.store.restock_for_repair(repair_id, parts)
    }

    fn index_component(&self, component: &Component) {
        let mut doc = HashMap::new();
        doc.insert("name".to_string(), component.name.clone());
        if let Some(note) = &component.note {
            doc.insert("note".to_string(), note.clone());
        }
        let _ = self.search.index(COLLECTION, &component.id, doc);
    }
}

#[cfg(test)]
mod tests {
    use fixerp_kv::RedbStore;
    use fixerp_search::TantivyEngine;
    use fixerp_sql::SqliteStore;
    use tempfile::TempDir;

    use super::*;
    use crate::model::Quality;

    fn test_service() -> (Arc<InventoryService>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let kv = Arc::new(RedbStore::open(&dir.path().join("carts.redb")).unwrap());
        let search = Arc::new(TantivyEngine::open(&dir.path().join("index")).unwrap());
        let svc = InventoryService::new(sql, kv, search).unwrap();
        (svc, dir)
    }

    fn make_component(svc: &InventoryService, name: &str) -> Component {
        svc.create_component(CreateComponent {
            name: name.into(),
            quality: Quality::Oem,
            purchase_price: 10000,
            public_price: 18000,
            low_stock_threshold: 2,
            supplier_id: None,
            phone_model_ids: vec![],
            note: None,
        })
        .unwrap()
    }

    #[test]
    fn new_component_starts_at_zero_stock() {
        let (svc, _dir) = test_service();
        let c = make_component(&svc, "iPhone 12 屏幕");
        assert_eq!(c.stock, 0);
    }

    #[test]
    fn cart_lines_merge_and_commit_moves_stock() {
        let (svc, _dir) = test_service();
        let screen = make_component(&svc, "屏幕");

        svc.put_line(
            CartKind::StockIn,
            "cart1",
            LineInput {
                component_id: screen.id.clone(),
                qty: 4,
                unit_price: Some(13000),
            },
        )
        .unwrap();
        let merged = svc
            .put_line(
                CartKind::StockIn,
                "cart1",
                LineInput {
                    component_id: screen.id.clone(),
                    qty: 6,
                    unit_price: Some(12000),
                },
            )
            .unwrap();
        assert_eq!(merged.qty, 10);

        let result = svc.commit_stockin("cart1", Some("sup1"), None).unwrap();
        assert_eq!(result.lines, 1);

        let screen = svc.get_component(&screen.id).unwrap();
        assert_eq!(screen.stock, 10);
        assert_eq!(screen.purchase_price, 12000);

        // Commit cleared the cart.
        assert!(svc.lines(CartKind::StockIn, "cart1").unwrap().is_empty());
    }

    #[test]
    fn committing_empty_cart_is_validation() {
        let (svc, _dir) = test_service();
        let err = svc.commit_stockin("nocart", None, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn failed_stockout_keeps_cart() {
        let (svc, _dir) = test_service();
        let screen = make_component(&svc, "屏幕");
        svc.put_line(
            CartKind::StockOut,
            "out1",
            LineInput {
                component_id: screen.id.clone(),
                qty: 3,
                unit_price: None,
            },
        )
        .unwrap();

        let err = svc.commit_stockout("out1", Some("盘点")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(svc.lines(CartKind::StockOut, "out1").unwrap().len(), 1);
    }

    #[test]
    fn line_price_defaults_to_purchase_price() {
        let (svc, _dir) = test_service();
        let screen = make_component(&svc, "屏幕");
        let line = svc
            .put_line(
                CartKind::StockIn,
                "cart1",
                LineInput {
                    component_id: screen.id.clone(),
                    qty: 1,
                    unit_price: None,
                },
            )
            .unwrap();
        assert_eq!(line.unit_price, 10000);
        assert_eq!(line.name, "屏幕");
    }

    #[test]
    fn search_finds_component_by_name() {
        let (svc, _dir) = test_service();
        let screen = make_component(&svc, "iPhone 12 屏幕总成");
        make_component(&svc, "华为 P40 电池");

        let hits = svc.search_components("屏幕", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, screen.id);
    }

    #[test]
    fn patch_cannot_touch_stock() {
        let (svc, _dir) = test_service();
        let screen = make_component(&svc, "屏幕");

        let updated = svc
            .update_component(
                &screen.id,
                serde_json::json!({"stock": 999, "publicPrice": 20000}),
            )
            .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.public_price, 20000);
    }
}
