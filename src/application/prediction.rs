//! Prediction service: Health checks and audited premium predictions.
//!
//! The classifier is loaded once at startup and injected here. Each
//! prediction attempt is timed and, when an audit log is configured, recorded
//! as one row whether it succeeded or not. Audit failures are logged and
//! dropped; they never change the response.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::domain::{AuditRecord, ModelError, Prediction, PredictionInput};
use crate::ports::{AuditLog, Classifier};
use crate::HealthdeskError;

/// Version reported when no model artifact could be loaded.
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: String,
}

/// Service for running audited predictions.
pub struct PredictionService<C, A>
where
    C: Classifier,
    A: AuditLog,
{
    classifier: Option<Arc<C>>,
    audit: Option<Arc<A>>,
}

impl<C, A> PredictionService<C, A>
where
    C: Classifier,
    A: AuditLog,
{
    /// Create a new prediction service.
    ///
    /// `classifier` is `None` when the model failed to load at startup;
    /// `audit` is `None` when no audit log is configured.
    pub fn new(classifier: Option<Arc<C>>, audit: Option<Arc<A>>) -> Self {
        Self { classifier, audit }
    }

    /// Version of the loaded model, or the default when none is loaded.
    #[must_use]
    pub fn model_version(&self) -> &str {
        self.classifier
            .as_deref()
            .map_or(DEFAULT_MODEL_VERSION, |c| c.version())
    }

    /// Report whether the model loaded. Never fails.
    #[must_use]
    pub fn health(&self) -> Health {
        Health {
            status: "OK",
            model_loaded: self.classifier.is_some(),
            version: self.model_version().to_string(),
        }
    }

    /// Run the classifier on `input`.
    ///
    /// # Errors
    /// Returns `Validation` for out-of-range input (not audited), or
    /// `Prediction` if the classifier is missing or fails.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction, HealthdeskError> {
        input.validate().map_err(HealthdeskError::Validation)?;

        let started = Instant::now();
        let outcome = self.run_model(input);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            Ok(prediction) => tracing::info!(
                "Prediction complete: category={}, confidence={:.2}%, latency_ms={:.2}",
                prediction.predicted_category,
                prediction.confidence * 100.0,
                latency_ms
            ),
            Err(e) => tracing::warn!("Prediction failed after {:.2} ms: {}", latency_ms, e),
        }

        self.record_audit(&AuditRecord::new(
            outcome.as_ref(),
            latency_ms,
            self.model_version(),
        ));

        outcome.map_err(HealthdeskError::Prediction)
    }

    fn run_model(&self, input: &PredictionInput) -> Result<Prediction, ModelError> {
        let classifier = self.classifier.as_ref().ok_or(ModelError::NotLoaded)?;

        let category = classifier.predict(input)?;
        let probabilities = classifier.predict_proba(input)?;
        Prediction::from_probabilities(category, classifier.class_labels(), &probabilities)
    }

    /// Best-effort audit append.
    fn record_audit(&self, record: &AuditRecord) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.append(record) {
                tracing::warn!("Failed to append audit record: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteAuditLog;
    use crate::domain::{AgeGroup, AuditStatus, LifestyleRisk, Occupation};

    /// Classifier double returning fixed probabilities.
    struct FixedClassifier {
        labels: Vec<String>,
        probabilities: Vec<f64>,
        fail: bool,
    }

    impl FixedClassifier {
        fn new(probabilities: Vec<f64>) -> Self {
            Self {
                labels: vec!["high".into(), "low".into(), "medium".into()],
                probabilities,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(vec![0.2, 0.3, 0.5])
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn version(&self) -> &str {
            "2.1.0"
        }

        fn class_labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&self, input: &PredictionInput) -> Result<String, ModelError> {
            let p = self.predict_proba(input)?;
            let best = p
                .iter()
                .enumerate()
                .fold(0, |best, (i, v)| if *v > p[best] { i } else { best });
            Ok(self.labels[best].clone())
        }

        fn predict_proba(&self, _input: &PredictionInput) -> Result<Vec<f64>, ModelError> {
            if self.fail {
                return Err(ModelError::NonFinite);
            }
            Ok(self.probabilities.clone())
        }
    }

    /// Audit double that always fails.
    struct BrokenAudit;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    impl AuditLog for BrokenAudit {
        type Error = DiskFull;

        fn append(&self, _record: &AuditRecord) -> Result<(), Self::Error> {
            Err(DiskFull)
        }
    }

    fn sample_input() -> PredictionInput {
        PredictionInput {
            bmi: 31.2,
            age_group: AgeGroup::Senior,
            lifestyle_risk: LifestyleRisk::High,
            city_tier: 1,
            income_lpa: 6.0,
            occupation: Occupation::Retired,
        }
    }

    #[test]
    fn test_health_reports_model_state() {
        let loaded: PredictionService<FixedClassifier, SqliteAuditLog> =
            PredictionService::new(Some(Arc::new(FixedClassifier::new(vec![1.0, 0.0, 0.0]))), None);
        assert_eq!(
            loaded.health(),
            Health {
                status: "OK",
                model_loaded: true,
                version: "2.1.0".into()
            }
        );

        let missing: PredictionService<FixedClassifier, SqliteAuditLog> =
            PredictionService::new(None, None);
        let health = missing.health();
        assert!(!health.model_loaded);
        assert_eq!(health.version, DEFAULT_MODEL_VERSION);
    }

    #[test]
    fn test_predict_success_is_audited() {
        let audit = Arc::new(SqliteAuditLog::in_memory().expect("Should create db"));
        let service = PredictionService::new(
            Some(Arc::new(FixedClassifier::new(vec![0.71234, 0.1, 0.18766]))),
            Some(Arc::clone(&audit)),
        );

        let prediction = service.predict(&sample_input()).expect("Should predict");
        assert_eq!(prediction.predicted_category, "high");
        assert!((prediction.confidence - 0.7123).abs() < 1e-12);
        assert!((prediction.class_probabilities["medium"] - 0.1877).abs() < 1e-12);

        let rows = audit.recent(10).expect("Should load");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AuditStatus::Success);
        assert_eq!(rows[0].predicted_category.as_deref(), Some("high"));
        assert_eq!(rows[0].model_version, "2.1.0");
        assert!(rows[0].latency_ms >= 0.0);
    }

    #[test]
    fn test_predict_failure_is_audited_and_hidden() {
        let audit = Arc::new(SqliteAuditLog::in_memory().expect("Should create db"));
        let service = PredictionService::new(
            Some(Arc::new(FixedClassifier::failing())),
            Some(Arc::clone(&audit)),
        );

        let err = service.predict(&sample_input()).expect_err("Should fail");
        assert!(matches!(err, HealthdeskError::Prediction(_)));

        let rows = audit.recent(10).expect("Should load");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AuditStatus::Error);
        assert!(rows[0].predicted_category.is_none());
    }

    #[test]
    fn test_missing_model_fails_prediction() {
        let audit = Arc::new(SqliteAuditLog::in_memory().expect("Should create db"));
        let service: PredictionService<FixedClassifier, _> =
            PredictionService::new(None, Some(Arc::clone(&audit)));

        assert!(matches!(
            service.predict(&sample_input()),
            Err(HealthdeskError::Prediction(ModelError::NotLoaded))
        ));
        let rows = audit.recent(1).expect("Should load");
        assert_eq!(rows[0].model_version, DEFAULT_MODEL_VERSION);
    }

    #[test]
    fn test_audit_failure_does_not_affect_response() {
        let service = PredictionService::new(
            Some(Arc::new(FixedClassifier::new(vec![0.1, 0.8, 0.1]))),
            Some(Arc::new(BrokenAudit)),
        );

        let prediction = service.predict(&sample_input()).expect("Should predict");
        assert_eq!(prediction.predicted_category, "low");
    }

    #[test]
    fn test_invalid_input_is_not_audited() {
        let audit = Arc::new(SqliteAuditLog::in_memory().expect("Should create db"));
        let service = PredictionService::new(
            Some(Arc::new(FixedClassifier::new(vec![0.1, 0.8, 0.1]))),
            Some(Arc::clone(&audit)),
        );

        let mut input = sample_input();
        input.city_tier = 9;
        assert!(matches!(
            service.predict(&input),
            Err(HealthdeskError::Validation(_))
        ));
        assert_eq!(audit.count().expect("Should count"), 0);
    }

    #[test]
    fn test_without_audit_log() {
        let service: PredictionService<_, SqliteAuditLog> = PredictionService::new(
            Some(Arc::new(FixedClassifier::new(vec![0.2, 0.2, 0.6]))),
            None,
        );
        assert_eq!(
            service
                .predict(&sample_input())
                .expect("Should predict")
                .predicted_category,
            "medium"
        );
    }
}
