//! Patient record API server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use healthdesk::adapters::json_file::JsonFileStore;
use healthdesk::application::RecordService;
use healthdesk::config::RecordsConfig;
use healthdesk::{http, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = telemetry::init().context("failed to initialise logging")?;
    let config = RecordsConfig::from_env().context("invalid configuration")?;

    let store = if config.init_store {
        JsonFileStore::open_or_init(&config.store_path).with_context(|| {
            format!("failed to initialise store at {}", config.store_path.display())
        })?
    } else {
        JsonFileStore::new(&config.store_path)
    };
    tracing::info!("Using patient store at {}", store.path().display());

    let service = Arc::new(RecordService::new(Arc::new(store)));
    let app = http::records::router(service);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Record API listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Record API shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
