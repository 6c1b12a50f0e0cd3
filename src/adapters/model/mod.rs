//! Model adapter: Implementation of Classifier.
//!
//! Loads a multinomial logistic model exported by the training pipeline as
//! JSON. Numeric columns are standardised with the exported mean and scale;
//! categorical columns are one-hot encoded, with unseen categories encoding
//! to all zeros.
//!
//! The SHA-256 of the artifact is logged at load time so audit rows can be
//! tied back to the exact file that produced them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureValue, ModelError, PredictionInput};
use crate::ports::Classifier;

/// Numeric column with its standardisation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// Categorical column with its one-hot category order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub categories: Vec<String>,
}

/// Model parameters exported by the training pipeline.
///
/// Encoded feature order: every numeric column, then the one-hot block of
/// every categorical column, each in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub classes: Vec<String>,
    pub numeric: Vec<NumericFeature>,
    pub categorical: Vec<CategoricalFeature>,
    /// One row of weights per class
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl ModelArtifact {
    /// Width of the encoded feature vector.
    #[must_use]
    pub fn encoded_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::Shape("model declares no classes".into()));
        }
        if self.coefficients.len() != self.classes.len()
            || self.intercepts.len() != self.classes.len()
        {
            return Err(ModelError::Shape(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }

        let width = self.encoded_width();
        if width == 0 {
            return Err(ModelError::Shape("model declares no features".into()));
        }
        if let Some(row) = self.coefficients.iter().position(|r| r.len() != width) {
            return Err(ModelError::Shape(format!(
                "coefficient row {row} has {} weights, expected {width}",
                self.coefficients[row].len()
            )));
        }
        if let Some(f) = self
            .numeric
            .iter()
            .find(|f| !f.scale.is_finite() || f.scale <= 0.0)
        {
            return Err(ModelError::Shape(format!(
                "feature {} has invalid scale {}",
                f.name, f.scale
            )));
        }
        Ok(())
    }
}

/// Logistic classifier backed by a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    artifact: ModelArtifact,
}

impl LogisticClassifier {
    /// Build a classifier from already parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError::Shape` if the parameters are inconsistent.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.check_shape()?;
        Ok(Self { artifact })
    }

    /// Load a model artifact from a JSON file.
    ///
    /// # Errors
    /// Returns `ModelError::Artifact` if the file cannot be read or parsed,
    /// or `ModelError::Shape` if the parameters are inconsistent.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ModelError::Artifact(format!("Failed to read {path:?}: {e}")))?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Artifact(format!("Invalid model format: {e}")))?;
        let classifier = Self::from_artifact(artifact)?;

        tracing::info!(
            "Loaded model {} from {:?} (sha256={}, classes={}, width={})",
            classifier.artifact.version,
            path,
            sha256_hex(&bytes),
            classifier.artifact.classes.len(),
            classifier.artifact.encoded_width()
        );
        Ok(classifier)
    }

    fn encode(&self, input: &PredictionInput) -> Result<Vec<f64>, ModelError> {
        let mut encoded = Vec::with_capacity(self.artifact.encoded_width());

        for feature in &self.artifact.numeric {
            match input.feature(&feature.name) {
                Some(FeatureValue::Number(x)) => encoded.push((x - feature.mean) / feature.scale),
                Some(FeatureValue::Category(_)) => {
                    return Err(ModelError::FeatureType(feature.name.clone()))
                }
                None => return Err(ModelError::MissingFeature(feature.name.clone())),
            }
        }

        for feature in &self.artifact.categorical {
            match input.feature(&feature.name) {
                Some(FeatureValue::Category(value)) => encoded.extend(
                    feature
                        .categories
                        .iter()
                        .map(|c| if c == value { 1.0 } else { 0.0 }),
                ),
                Some(FeatureValue::Number(_)) => {
                    return Err(ModelError::FeatureType(feature.name.clone()))
                }
                None => return Err(ModelError::MissingFeature(feature.name.clone())),
            }
        }

        Ok(encoded)
    }

    fn scores(&self, encoded: &[f64]) -> Vec<f64> {
        self.artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(row, b)| row.iter().zip(encoded).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LogisticClassifier {
    fn version(&self) -> &str {
        &self.artifact.version
    }

    fn class_labels(&self) -> &[String] {
        &self.artifact.classes
    }

    fn predict(&self, input: &PredictionInput) -> Result<String, ModelError> {
        let probabilities = self.predict_proba(input)?;

        // First maximum wins on ties.
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }
        Ok(self.artifact.classes[best].clone())
    }

    fn predict_proba(&self, input: &PredictionInput) -> Result<Vec<f64>, ModelError> {
        let encoded = self.encode(input)?;
        softmax(&self.scores(&encoded))
    }
}

fn softmax(scores: &[f64]) -> Result<Vec<f64>, ModelError> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(ModelError::NonFinite);
    }

    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(ModelError::NonFinite);
    }
    Ok(exps.into_iter().map(|e| e / total).collect())
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeGroup, LifestyleRisk, Occupation};
    use tempfile::tempdir;

    fn input(bmi: f64, lifestyle_risk: LifestyleRisk) -> PredictionInput {
        PredictionInput {
            bmi,
            age_group: AgeGroup::Adult,
            lifestyle_risk,
            city_tier: 1,
            income_lpa: 10.0,
            occupation: Occupation::PrivateJob,
        }
    }

    /// Two classes driven by bmi and a "high" lifestyle flag.
    fn tiny_artifact() -> ModelArtifact {
        ModelArtifact {
            version: "test-1".into(),
            classes: vec!["high".into(), "low".into()],
            numeric: vec![NumericFeature {
                name: "bmi".into(),
                mean: 25.0,
                scale: 5.0,
            }],
            categorical: vec![CategoricalFeature {
                name: "lifestyle_risk".into(),
                categories: vec!["low".into(), "high".into()],
            }],
            coefficients: vec![vec![2.0, 0.0, 1.0], vec![-2.0, 0.0, -1.0]],
            intercepts: vec![0.0, 0.0],
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = LogisticClassifier::from_artifact(tiny_artifact()).expect("valid");
        let p = model
            .predict_proba(&input(31.0, LifestyleRisk::High))
            .expect("scored");
        assert_eq!(p.len(), 2);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[0] > p[1]);
    }

    #[test]
    fn test_predict_picks_most_probable_class() {
        let model = LogisticClassifier::from_artifact(tiny_artifact()).expect("valid");
        assert_eq!(
            model.predict(&input(35.0, LifestyleRisk::High)).expect("ok"),
            "high"
        );
        assert_eq!(
            model.predict(&input(18.0, LifestyleRisk::Low)).expect("ok"),
            "low"
        );
    }

    #[test]
    fn test_tie_goes_to_first_class() {
        let model = LogisticClassifier::from_artifact(tiny_artifact()).expect("valid");
        // bmi at the mean and an unlisted category: every score is 0
        let p = model
            .predict_proba(&input(25.0, LifestyleRisk::Medium))
            .expect("scored");
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert_eq!(
            model.predict(&input(25.0, LifestyleRisk::Medium)).expect("ok"),
            "high"
        );
    }

    #[test]
    fn test_rejects_inconsistent_shapes() {
        let mut artifact = tiny_artifact();
        artifact.coefficients[1].pop();
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ModelError::Shape(_))
        ));

        let mut artifact = tiny_artifact();
        artifact.intercepts.push(1.0);
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ModelError::Shape(_))
        ));

        let mut artifact = tiny_artifact();
        artifact.numeric[0].scale = 0.0;
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn test_unknown_feature_name_fails() {
        let mut artifact = tiny_artifact();
        artifact.numeric[0].name = "smoker".into();
        let model = LogisticClassifier::from_artifact(artifact).expect("shape ok");
        assert!(matches!(
            model.predict_proba(&input(25.0, LifestyleRisk::Low)),
            Err(ModelError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_feature_type_mismatch_fails() {
        let mut artifact = tiny_artifact();
        artifact.numeric[0].name = "occupation".into();
        let model = LogisticClassifier::from_artifact(artifact).expect("shape ok");
        assert!(matches!(
            model.predict(&input(25.0, LifestyleRisk::Low)),
            Err(ModelError::FeatureType(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_vec(&tiny_artifact()).expect("serialize"))
            .expect("write");

        let model = LogisticClassifier::load(&path).expect("load");
        assert_eq!(model.version(), "test-1");
        assert_eq!(model.class_labels(), ["high".to_string(), "low".to_string()]);
    }

    #[test]
    fn test_load_failures() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            LogisticClassifier::load(&dir.path().join("missing.json")),
            Err(ModelError::Artifact(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[]").expect("write");
        assert!(matches!(
            LogisticClassifier::load(&path),
            Err(ModelError::Artifact(_))
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/premium_model.json");
        let model = LogisticClassifier::load(&path).expect("bundled model");
        assert_eq!(model.class_labels().len(), 3);

        let p = model
            .predict_proba(&input(27.0, LifestyleRisk::Medium))
            .expect("scored");
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_softmax_rejects_non_finite() {
        assert!(matches!(softmax(&[f64::NAN]), Err(ModelError::NonFinite)));
        assert!(matches!(softmax(&[]), Err(ModelError::NonFinite)));
    }
}
