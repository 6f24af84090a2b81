//! HTTP surface.
//!
//! JSON API under `/api` plus the embedded browser UI:
//! - `GET /api/tables` - catalog dump
//! - `POST /api/query` - point read or key query
//! - `POST /api/update` - full-item replace
//! - `POST /api/delete` - confirmation-guarded delete
//! - `GET /api/health` - liveness
//! - `GET /` and `GET /static/{file}` - UI assets
//!
//! Every gateway error is answered with HTTP 400 and
//! `{"success": false, "error": "..."}`.

mod assets;
pub mod rest;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::gateway::Gateway;
use crate::utils::bootstrap::shutdown_signal;

/// Build the axum router (separated for testing).
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/api/health", get(rest::health))
        .route("/api/tables", get(rest::get_tables))
        .route("/api/query", post(rest::execute_query))
        .route("/api/update", post(rest::update_item))
        .route("/api/delete", post(rest::delete_item))
        .route("/", get(assets::index))
        .route("/static/*path", get(assets::static_file))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Serve the API until a shutdown signal arrives.
///
/// When the configured port is 0, the OS assigns an ephemeral port. The
/// actual bound address is always logged.
pub async fn serve(
    gateway: Arc<Gateway>,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(gateway);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let local = listener.local_addr()?;
    info!(address = %local, "ddbgate listening on http://localhost:{}", local.port());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
