//! Ports layer: Trait definitions for external operations.
//!
//! These traits are the boundaries between the application services and
//! the file store, the trained model and the audit database.

mod audit;
mod classifier;
mod storage;

pub use audit::AuditLog;
pub use classifier::Classifier;
pub use storage::PatientStore;
