//! # Healthdesk
//!
//! Two small HTTP services over patient data:
//! - a record store API that keeps BMI and its verdict consistent with the
//!   stored height and weight on every write
//! - a premium-category prediction API wrapping a trained classifier, with an
//!   optional append-only audit log
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patients, derived metrics, predictions)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (JSON file, model artifact, SQLite)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum routers exposing the use cases

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;
pub mod telemetry;

pub use domain::{Patient, PatientPatch, PatientRecord, Prediction, PredictionInput, Verdict};

/// Result type for Healthdesk operations
pub type Result<T> = std::result::Result<T, HealthdeskError>;

/// Main error type for Healthdesk
#[derive(Debug, thiserror::Error)]
pub enum HealthdeskError {
    #[error("Patient {0} not found")]
    NotFound(String),

    #[error("Patient {0} already exists")]
    Conflict(String),

    #[error("Invalid patient data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] domain::ModelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<domain::MetricsError> for HealthdeskError {
    fn from(e: domain::MetricsError) -> Self {
        Self::Validation(vec![e.to_string()])
    }
}
