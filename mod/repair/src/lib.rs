//! Repair module — repair tickets, their lifecycle, and warranties.
//!
//! A ticket moves PENDING → REPAIRING → REPAIRED → PICKED_UP, with
//! cancellation from the first two states and a warranty-gated rework loop
//! from PICKED_UP. Completing a repair consumes parts from the inventory
//! module; picking one up opens a 90-day warranty in the same transaction
//! as the status write. All status writes are compare-and-swap.

pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::RepairService;

/// Repair module implementing the Module trait.
pub struct RepairModule {
    service: Arc<RepairService>,
}

impl RepairModule {
    pub fn new(
        sql: Arc<dyn fixerp_sql::SQLStore>,
        inventory: Arc<fixerp_inventory::service::InventoryService>,
        crm: Arc<fixerp_crm::service::CrmService>,
        catalog: Arc<fixerp_catalog::service::CatalogService>,
    ) -> Result<Self, fixerp_core::ServiceError> {
        let service = RepairService::new(sql, inventory, crm, catalog)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<RepairService> {
        &self.service
    }
}

impl Module for RepairModule {
    fn name(&self) -> &str {
        "repair"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
