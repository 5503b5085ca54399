use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use fixerp_core::{ListParams, ListResult, ServiceError, merge_patch, new_id, now_rfc3339};
use fixerp_crm::service::CrmService;
use fixerp_kv::KVStore;
use fixerp_sql::SQLStore;
use fixerp_staging::StagingCart;

use crate::model::{
    CheckoutInput, CreateSellItem, DailySummary, ItemFilter, PosLine, PosLineInput, Sale,
    SaleFilter, SellItem,
};
use crate::store::SellStore;

/// Sell service: accessory items, the POS staging cart, checkout and the
/// sales history.
pub struct SellService {
    store: SellStore,
    pos: StagingCart<PosLine>,
    crm: Arc<CrmService>,
}

impl SellService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        crm: Arc<CrmService>,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = SellStore::new(sql)?;
        Ok(Arc::new(Self {
            store,
            pos: StagingCart::new(kv, "pos"),
            crm,
        }))
    }

    pub fn create_item(&self, input: CreateSellItem) -> Result<SellItem, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if input.purchase_price < 0 || input.public_price < 0 {
            return Err(ServiceError::Validation("price must not be negative".into()));
        }
        if input.stock < 0 {
            return Err(ServiceError::Validation("stock must not be negative".into()));
        }
        let barcode = input
            .barcode
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let now = now_rfc3339();
        let item = SellItem {
            id: new_id(),
            name,
            category: input.category,
            barcode,
            purchase_price: input.purchase_price,
            public_price: input.public_price,
            stock: input.stock,
            active: input.active,
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.create_item(&item)?;
        Ok(item)
    }

    pub fn get_item(&self, id: &str) -> Result<SellItem, ServiceError> {
        self.store.get_item(id)
    }

    /// Barcode-scanner lookup at the counter.
    pub fn get_item_by_barcode(&self, barcode: &str) -> Result<SellItem, ServiceError> {
        self.store.get_by_barcode(barcode)
    }

    pub fn list_items(
        &self,
        params: &ListParams,
        filter: &ItemFilter,
    ) -> Result<ListResult<SellItem>, ServiceError> {
        self.store.list_items(params, filter)
    }

    /// Merge-patch an item. Stock cannot be patched; it only moves through
    /// checkout, void and restock.
    pub fn update_item(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<SellItem, ServiceError> {
        let current = self.store.get_item(id)?;
        let mut base =
            serde_json::to_value(&current).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("id");
            obj.remove("createdAt");
            obj.remove("stock");
            obj.insert("updatedAt".into(), serde_json::json!(now_rfc3339()));
        }
        merge_patch(&mut base, &patch);

        let updated: SellItem = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {e}")))?;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if updated.purchase_price < 0 || updated.public_price < 0 {
            return Err(ServiceError::Validation("price must not be negative".into()));
        }

        self.store.update_item(&updated)?;
        Ok(updated)
    }

    pub fn delete_item(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete_item(id)
    }

    /// Book a delivery straight onto the shelf stock.
    pub fn restock_item(&self, id: &str, qty: i64) -> Result<SellItem, ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::Validation("qty must be positive".into()));
        }
        self.store.restock(id, qty, &now_rfc3339())?;
        self.store.get_item(id)
    }

    /// Put a line into a POS cart. An existing line for the same item
    /// merges (quantities add, price takes the latest value).
    pub fn put_pos_line(&self, cart_id: &str, input: PosLineInput) -> Result<PosLine, ServiceError> {
        if input.qty <= 0 {
            return Err(ServiceError::Validation("qty must be positive".into()));
        }
        let item = self.store.get_item(&input.item_id)?;
        if !item.active {
            return Err(ServiceError::Validation(format!(
                "item '{}' is inactive",
                item.name
            )));
        }

        let line = PosLine {
            item_id: item.id,
            name: item.name,
            qty: input.qty,
            unit_price: input.unit_price.unwrap_or(item.public_price),
        };
        self.pos.upsert_line(cart_id, line)
    }

    pub fn pos_lines(&self, cart_id: &str) -> Result<Vec<PosLine>, ServiceError> {
        self.pos.lines(cart_id)
    }

    pub fn remove_pos_line(&self, cart_id: &str, item_id: &str) -> Result<(), ServiceError> {
        self.pos.remove_line(cart_id, item_id)
    }

    /// Drop a whole cart. Returns the number of lines removed.
    pub fn clear_pos(&self, cart_id: &str) -> Result<usize, ServiceError> {
        self.pos.clear(cart_id)
    }

    /// Turn a POS cart into a sale. The cart is cleared only after the
    /// batch lands, so insufficient stock leaves it intact for a retry.
    pub fn checkout(
        &self,
        cart_id: &str,
        cashier_id: &str,
        input: CheckoutInput,
    ) -> Result<Sale, ServiceError> {
        let lines = self.pos.lines(cart_id)?;
        if lines.is_empty() {
            return Err(ServiceError::Validation(format!("cart '{cart_id}' is empty")));
        }

        let subtotal: i64 = lines.iter().map(|l| l.qty * l.unit_price).sum();
        let discount = input.discount.unwrap_or(0);
        if discount < 0 {
            return Err(ServiceError::Validation(
                "discount must not be negative".into(),
            ));
        }
        if discount > subtotal {
            return Err(ServiceError::Validation(
                "discount cannot exceed the subtotal".into(),
            ));
        }

        if let Some(customer_id) = &input.customer_id {
            self.crm.get_customer(customer_id)?;
        }

        let sale = Sale {
            id: new_id(),
            lines,
            subtotal,
            discount,
            total: subtotal - discount,
            payment: input.payment,
            customer_id: input.customer_id,
            cashier_id: cashier_id.to_string(),
            voided: false,
            created_at: now_rfc3339(),
        };

        self.store.checkout(&sale)?;
        self.pos.clear(cart_id)?;
        Ok(sale)
    }

    pub fn get_sale(&self, id: &str) -> Result<Sale, ServiceError> {
        self.store.get_sale(id)
    }

    pub fn list_sales(
        &self,
        params: &ListParams,
        filter: &SaleFilter,
    ) -> Result<ListResult<Sale>, ServiceError> {
        self.store.list_sales(params, filter)
    }

    /// Cancel a sale and put the stock back. The lines come from the
    /// committed `sale_items` history, not from the JSON document.
    pub fn void_sale(&self, id: &str) -> Result<Sale, ServiceError> {
        let sale = self.store.get_sale(id)?;
        if sale.voided {
            return Err(ServiceError::Conflict(format!("sale {id} already voided")));
        }

        let lines = self.store.sale_lines(id)?;
        self.store.void_sale(id, &lines, &now_rfc3339())?;
        self.store.get_sale(id)
    }

    /// Count and revenue for one calendar day. Defaults to today.
    pub fn summary(&self, date: Option<String>) -> Result<DailySummary, ServiceError> {
        let date = match date {
            Some(d) => {
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|_| ServiceError::Validation("date must be YYYY-MM-DD".into()))?;
                d
            }
            None => Utc::now().format("%Y-%m-%d").to_string(),
        };

        let (count, revenue) = self.store.summary(&date)?;
        Ok(DailySummary {
            date,
            count,
            revenue,
        })
    }
}
