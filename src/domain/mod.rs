//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Records validate themselves and keep their
//! derived fields in step with their measurements.

mod metrics;
mod patient;
mod prediction;

pub use metrics::{derive_metrics, BodyMetrics, MetricsError, Verdict};
pub use patient::{
    Gender, Patient, PatientEntry, PatientMap, PatientPatch, PatientRecord, SortField, SortOrder,
    MAX_AGE, MIN_AGE,
};
pub use prediction::{
    AgeGroup, AuditRecord, AuditStatus, FeatureValue, LifestyleRisk, ModelError, Occupation,
    Prediction, PredictionInput,
};
