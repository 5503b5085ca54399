//! `fixerpd` — the fixerp shop server.
//!
//! Usage:
//!   fixerpd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/fixerp/<name>.toml`.
//! If a path with `/` or `.` is given, it is used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod login;
mod routes;

use std::sync::Arc;

use clap::Parser;
use fixerp_core::Module;
use tracing::info;

use config::ServerConfig;
use routes::ServerState;

/// fixerp server.
#[derive(Parser, Debug)]
#[command(name = "fixerpd", about = "fixerp shop server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", default_value = "fixerpd")]
    config: String,

    /// Listen address (overrides the config).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let listen = cli
        .listen
        .or_else(|| server_config.server.listen.clone())
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = fixerp_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: listen.clone(),
        ..Default::default()
    };

    // Embedded stores, shared by all modules.
    let kv: Arc<dyn fixerp_kv::KVStore> = Arc::new(
        fixerp_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {e}"))?,
    );
    let sql: Arc<dyn fixerp_sql::SQLStore> = Arc::new(
        fixerp_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {e}"))?,
    );
    let search: Arc<dyn fixerp_search::SearchEngine> = Arc::new(
        fixerp_search::TantivyEngine::open(&core_config.resolve_search_dir())
            .map_err(|e| anyhow::anyhow!("failed to open search engine: {e}"))?,
    );

    let auth_config = fixerp_auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        access_token_ttl: server_config.jwt.expire_secs,
        ..Default::default()
    };
    let auth_module = fixerp_auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    let catalog_module = fixerp_catalog::CatalogModule::new(Arc::clone(&sql))?;
    let crm_module = fixerp_crm::CrmModule::new(Arc::clone(&sql), Arc::clone(&search))?;
    let inventory_module = fixerp_inventory::InventoryModule::new(
        Arc::clone(&sql),
        Arc::clone(&kv),
        Arc::clone(&search),
    )?;
    // Repair consumes inventory parts and snapshots customer/model names;
    // sell records the customer on a sale. They share the same service
    // instances as the HTTP routes.
    let repair_module = fixerp_repair::RepairModule::new(
        Arc::clone(&sql),
        Arc::clone(inventory_module.service()),
        Arc::clone(crm_module.service()),
        Arc::clone(catalog_module.service()),
    )?;
    let sell_module = fixerp_sell::SellModule::new(
        Arc::clone(&sql),
        Arc::clone(&kv),
        Arc::clone(crm_module.service()),
    )?;
    info!("modules initialized");

    bootstrap::ensure_settings(catalog_module.service())?;

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (catalog_module.name(), catalog_module.routes()),
        (crm_module.name(), crm_module.routes()),
        (inventory_module.name(), inventory_module.routes()),
        (repair_module.name(), repair_module.routes()),
        (sell_module.name(), sell_module.routes()),
    ];

    let state = ServerState {
        auth: Arc::clone(auth_module.service()),
        config: Arc::new(server_config),
    };
    let app = routes::build_router(state, module_routes);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("fixerpd listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}
