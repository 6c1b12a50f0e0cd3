//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the record store and prediction use cases.

mod prediction;
mod records;

pub use prediction::{Health, PredictionService, DEFAULT_MODEL_VERSION};
pub use records::RecordService;
