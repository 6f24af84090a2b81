//! ddbgate: catalog-driven DynamoDB query/update/delete gateway
//!
//! ## Architecture
//! ```text
//! [Browser UI / curl] -> [HTTP :8080] -> [Gateway] -> [Catalog + Translator]
//!                                            |
//!                                            v
//!                                     [KeyValueStore] -> DynamoDB
//! ```
//!
//! ## Configuration
//! - PORT: listen port (default: 8080)
//! - AWS_PROFILE: credential profile (default: "default")
//! - DDBGATE_CONFIG: YAML config file
//! - DDBGATE_LOG: tracing filter (default: info)

use std::sync::Arc;

use tracing::{error, info};

use ddbgate::api;
use ddbgate::catalog::Catalog;
use ddbgate::config::Config;
use ddbgate::gateway::Gateway;
use ddbgate::storage::init_store;
use ddbgate::utils::bootstrap::{init_tracing, parse_config_path};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::builtin()?,
    };
    let catalog = Arc::new(catalog);

    info!(
        profile = %config.store.profile,
        region = %config.store.region,
        store = ?config.store.store_type,
        tables = catalog.table_count(),
        "starting ddbgate"
    );

    let store = init_store(&config.store, &catalog).await?;
    let gateway = Arc::new(Gateway::new(catalog, store));

    api::serve(gateway, &config.server)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    Ok(())
}
