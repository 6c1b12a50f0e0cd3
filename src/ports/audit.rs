//! Audit port: Trait for the append-only prediction log.

use crate::domain::AuditRecord;

/// Trait for an append-only audit sink.
pub trait AuditLog: Send + Sync {
    /// Error type for audit writes.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one record. The write either commits fully or not at all.
    ///
    /// # Errors
    /// Returns error if the record could not be committed.
    fn append(&self, record: &AuditRecord) -> Result<(), Self::Error>;
}
