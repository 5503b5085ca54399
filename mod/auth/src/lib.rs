//! Auth module — staff accounts, password login, JWT sessions.
//!
//! # Resources
//!
//! - **User** — staff account with a role (admin / clerk / technician)
//! - **Session** — JWT issuance record, revocable
//!
//! # Usage
//!
//! ```ignore
//! use fixerp_auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, AuthConfig::default())?;
//! let router = module.routes(); // mount under /auth
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use fixerp_core::Module;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule over the shared SQL store.
    pub fn new(
        sql: Arc<dyn fixerp_sql::SQLStore>,
        config: AuthConfig,
    ) -> Result<Self, fixerp_core::ServiceError> {
        let service = AuthService::new(sql, config)?;
        Ok(Self { service })
    }

    /// The underlying AuthService. The server's JWT middleware verifies
    /// tokens through it so revocation takes effect everywhere.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
