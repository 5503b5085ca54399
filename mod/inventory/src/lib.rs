//! Inventory module — repair components and their stock ledger.
//!
//! Components are spare parts (screens, batteries, flex cables) tracked
//! with a stock count. Stock only moves through transactional commits:
//! stock-in and stock-out carts staged in the KV store, and the internal
//! consume/restock API the repair module uses. Every commit writes one
//! movement row per line inside the same transaction, so the ledger always
//! explains the current counts.

pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::InventoryService;

/// Inventory module implementing the Module trait.
pub struct InventoryModule {
    service: Arc<InventoryService>,
}

impl InventoryModule {
    pub fn new(
        sql: Arc<dyn fixerp_sql::SQLStore>,
        kv: Arc<dyn fixerp_kv::KVStore>,
        search: Arc<dyn fixerp_search::SearchEngine>,
    ) -> Result<Self, fixerp_core::ServiceError> {
        let service = InventoryService::new(sql, kv, search)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<InventoryService> {
        &self.service
    }
}

impl Module for InventoryModule {
    fn name(&self) -> &str {
        "inventory"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
