//! Classifier port: Trait for the pre-trained premium model.
//!
//! The model is opaque to the application. It maps an input to one of its
//! class labels and to a probability per label.

use crate::domain::{ModelError, PredictionInput};

/// Trait for a trained classification model.
pub trait Classifier: Send + Sync {
    /// Version string reported by health checks and written to audit rows.
    fn version(&self) -> &str;

    /// Class labels, in the order `predict_proba` reports them.
    fn class_labels(&self) -> &[String];

    /// Predict the most likely class label.
    ///
    /// # Errors
    /// Returns `ModelError` if the input cannot be encoded or scored.
    fn predict(&self, input: &PredictionInput) -> Result<String, ModelError>;

    /// Probability per class, aligned with `class_labels`.
    ///
    /// # Errors
    /// Returns `ModelError` if the input cannot be encoded or scored.
    fn predict_proba(&self, input: &PredictionInput) -> Result<Vec<f64>, ModelError>;
}
