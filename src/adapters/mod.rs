//! Adapters layer: Concrete implementations of ports.
//!
//! - `json_file`: flat JSON file for the patient store
//! - `model`: JSON-exported logistic model for premium prediction
//! - `sqlite`: SQLite table for the prediction audit log
//! - `sanitize`: PII filtering for logs

pub mod json_file;
pub mod model;
pub mod sanitize;
pub mod sqlite;

// Adapter errors surfaced through the public API
pub use json_file::StorageError;
pub use sqlite::AuditError;
