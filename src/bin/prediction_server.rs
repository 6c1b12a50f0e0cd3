//! Premium prediction API server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use healthdesk::adapters::model::LogisticClassifier;
use healthdesk::adapters::sqlite::SqliteAuditLog;
use healthdesk::application::PredictionService;
use healthdesk::config::PredictionConfig;
use healthdesk::{http, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = telemetry::init().context("failed to initialise logging")?;
    let config = PredictionConfig::from_env().context("invalid configuration")?;

    // The service still starts without a model; /health reports it.
    let classifier = match LogisticClassifier::load(&config.model_path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            tracing::warn!(
                "Model unavailable at {}: {}",
                config.model_path.display(),
                e
            );
            None
        }
    };

    let audit = match &config.audit_db {
        Some(path) => match SqliteAuditLog::new(path) {
            Ok(log) => {
                tracing::info!("Auditing predictions to {}", path.display());
                Some(Arc::new(log))
            }
            Err(e) => {
                tracing::warn!("Audit log disabled, failed to open {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let service = Arc::new(PredictionService::new(classifier, audit));
    let app = http::prediction::router(service);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Prediction API listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Prediction API shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
