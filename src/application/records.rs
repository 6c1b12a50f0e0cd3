//! Record service: list, get, sort, create, update and delete patients.
//!
//! Every operation loads the whole store first. Mutating operations save the
//! whole store back. One mutex per service serialises each
//! load-modify-save sequence, so two concurrent updates cannot both start
//! from the same snapshot and silently drop one another's change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::StorageError;
use crate::domain::{
    Patient, PatientEntry, PatientMap, PatientPatch, PatientRecord, SortField, SortOrder,
};
use crate::ports::PatientStore;
use crate::HealthdeskError;

/// Service for patient record operations.
pub struct RecordService<S>
where
    S: PatientStore,
{
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S> RecordService<S>
where
    S: PatientStore,
    S::Error: Into<StorageError>,
{
    /// Create a new record service over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    // The lock guards no data, so a poisoned lock is still safe to reuse.
    fn serialize(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<PatientMap, HealthdeskError> {
        self.store
            .load()
            .map_err(|e| HealthdeskError::Storage(e.into()))
    }

    fn save(&self, patients: &PatientMap) -> Result<(), HealthdeskError> {
        self.store
            .save(patients)
            .map_err(|e| HealthdeskError::Storage(e.into()))
    }

    /// Return the whole store.
    ///
    /// # Errors
    /// Returns error if the store cannot be loaded.
    pub fn list(&self) -> Result<PatientMap, HealthdeskError> {
        let _guard = self.serialize();
        self.load()
    }

    /// Return one patient.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn get(&self, id: &str) -> Result<PatientRecord, HealthdeskError> {
        let _guard = self.serialize();
        let mut patients = self.load()?;
        patients
            .remove(id)
            .ok_or_else(|| HealthdeskError::NotFound(id.to_string()))
    }

    /// Return every patient ordered by `field`.
    ///
    /// The sort is stable: patients with equal values keep their store order
    /// in both directions. Parameters are checked before the store is read.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an unknown field or order, or a storage error.
    pub fn sort(&self, field: &str, order: &str) -> Result<Vec<PatientEntry>, HealthdeskError> {
        let field: SortField = field.parse().map_err(HealthdeskError::InvalidArgument)?;
        let order: SortOrder = order.parse().map_err(HealthdeskError::InvalidArgument)?;

        let patients = {
            let _guard = self.serialize();
            self.load()?
        };

        let mut entries: Vec<PatientEntry> = patients
            .into_iter()
            .map(|(id, record)| PatientEntry { id, record })
            .collect();
        entries.sort_by(|a, b| {
            let (x, y) = (a.record.sort_value(field), b.record.sort_value(field));
            match order {
                SortOrder::Asc => x.total_cmp(&y),
                SortOrder::Desc => y.total_cmp(&x),
            }
        });
        Ok(entries)
    }

    /// Insert a new patient with freshly computed metrics.
    ///
    /// # Errors
    /// Returns `Validation` for invalid fields, `Conflict` if the id is taken,
    /// or a storage error.
    pub fn create(&self, patient: Patient) -> Result<(), HealthdeskError> {
        let (id, record) = patient.into_entry().map_err(HealthdeskError::Validation)?;

        let _guard = self.serialize();
        let mut patients = self.load()?;
        if patients.contains_key(&id) {
            tracing::warn!("Rejected create for existing patient {}", id);
            return Err(HealthdeskError::Conflict(id));
        }

        tracing::info!(
            "Creating patient {} (bmi={:?}, verdict={:?})",
            id,
            record.bmi,
            record.verdict
        );
        patients.insert(id, record);
        self.save(&patients)
    }

    /// Merge `patch` into an existing patient and recompute its metrics.
    ///
    /// Fields the patch leaves absent or `null` keep their stored values.
    /// Metrics are recomputed even when height and weight are untouched.
    /// An invalid patch fails before the store is read, so nothing is saved.
    ///
    /// # Errors
    /// Returns `Validation` for invalid values, `NotFound` for an unknown id,
    /// or a storage error.
    pub fn update(&self, id: &str, patch: &PatientPatch) -> Result<PatientRecord, HealthdeskError> {
        patch.validate().map_err(HealthdeskError::Validation)?;

        let _guard = self.serialize();
        let mut patients = self.load()?;
        let current = patients
            .get(id)
            .ok_or_else(|| HealthdeskError::NotFound(id.to_string()))?;

        let mut updated = current.clone();
        patch.apply(&mut updated)?;
        updated.validate().map_err(HealthdeskError::Validation)?;

        tracing::info!(
            "Updating patient {} (bmi={:?}, verdict={:?})",
            id,
            updated.bmi,
            updated.verdict
        );
        patients.insert(id.to_string(), updated.clone());
        self.save(&patients)?;
        Ok(updated)
    }

    /// Remove a patient.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn delete(&self, id: &str) -> Result<(), HealthdeskError> {
        let _guard = self.serialize();
        let mut patients = self.load()?;
        if patients.remove(id).is_none() {
            return Err(HealthdeskError::NotFound(id.to_string()));
        }

        tracing::info!("Deleting patient {}", id);
        self.save(&patients)
    }
}
