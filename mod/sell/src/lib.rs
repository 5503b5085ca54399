//! Sell module — accessory retail over the counter.
//!
//! Items carry a shelf stock that only moves through checkout, void and
//! restock. Carts are staged in the KV store per POS terminal; checkout
//! turns a cart into a sale and decrements stock in one transaction, and
//! `@void` reverses a sale from its committed line history.

pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::SellService;

/// Sell module implementing the Module trait.
pub struct SellModule {
    service: Arc<SellService>,
}

impl SellModule {
    pub fn new(
        sql: Arc<dyn fixerp_sql::SQLStore>,
        kv: Arc<dyn fixerp_kv::KVStore>,
        crm: Arc<fixerp_crm::service::CrmService>,
    ) -> Result<Self, fixerp_core::ServiceError> {
        let service = SellService::new(sql, kv, crm)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<SellService> {
        &self.service
    }
}

impl Module for SellModule {
    fn name(&self) -> &str {
        "sell"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
