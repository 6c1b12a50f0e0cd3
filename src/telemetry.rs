//! Tracing subscriber setup shared by both servers.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::sanitize::SanitizingMakeWriter;
use crate::HealthdeskError;

const DEFAULT_LOG_FILE: &str = "data/healthdesk.log";

/// Install the global subscriber.
///
/// Logs go to stdout unless `HEALTHDESK_LOG_MODE=file`, in which case they
/// are appended to `HEALTHDESK_LOG_FILE`. Every line is sanitized before it
/// is written. Keep the returned guard alive until shutdown so buffered
/// lines are flushed.
///
/// # Errors
/// Returns `Io` if the log file cannot be opened, or `Config` if a global
/// subscriber is already installed.
pub fn init() -> Result<WorkerGuard, HealthdeskError> {
    let log_mode = std::env::var("HEALTHDESK_LOG_MODE").unwrap_or_else(|_| "stdout".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file =
            std::env::var("HEALTHDESK_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

        if let Some(parent) = Path::new(&log_file).parent() {
            // Best-effort: opening the file below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .try_init()
        .map_err(|e| HealthdeskError::Config(format!("Failed to install subscriber: {e}")))?;

    Ok(guard)
}
