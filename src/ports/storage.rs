//! Storage port: Trait for the patient record store.
//!
//! Every operation is whole-store: callers load a full snapshot, mutate it
//! in memory and save it back in full.

use crate::domain::PatientMap;

/// Trait for durable patient storage.
pub trait PatientStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the whole store.
    ///
    /// # Errors
    /// Returns error if the backing storage is missing, unreadable or
    /// does not hold a well-formed store.
    fn load(&self) -> Result<PatientMap, Self::Error>;

    /// Replace the whole store.
    ///
    /// # Errors
    /// Returns error if the write fails.
    fn save(&self, patients: &PatientMap) -> Result<(), Self::Error>;
}
