//! Premium-category prediction types.
//!
//! Input features mirror the insurance pricing model: a precomputed BMI,
//! coarse age and lifestyle buckets, city tier, income and occupation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metrics::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Young,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Adult => "adult",
            Self::MiddleAged => "middle_aged",
            Self::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleRisk {
    Low,
    Medium,
    High,
}

impl LifestyleRisk {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    Retired,
    Freelancer,
    Student,
    GovernmentJob,
    BusinessOwner,
    Unemployed,
    PrivateJob,
}

impl Occupation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retired => "retired",
            Self::Freelancer => "freelancer",
            Self::Student => "student",
            Self::GovernmentJob => "government_job",
            Self::BusinessOwner => "business_owner",
            Self::Unemployed => "unemployed",
            Self::PrivateJob => "private_job",
        }
    }
}

/// Request body for a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    pub bmi: f64,
    pub age_group: AgeGroup,
    pub lifestyle_risk: LifestyleRisk,
    /// 1 (metro) to 3 (small town)
    pub city_tier: u8,
    /// Annual income in lakh rupees
    pub income_lpa: f64,
    pub occupation: Occupation,
}

/// A single model input value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(&'static str),
}

impl PredictionInput {
    /// Validate ranges serde cannot express.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.bmi.is_finite() || self.bmi <= 0.0 {
            errors.push(format!("bmi must be greater than 0, got {}", self.bmi));
        }
        if !(1..=3).contains(&self.city_tier) {
            errors.push(format!("cityTier {} out of range [1, 3]", self.city_tier));
        }
        if !self.income_lpa.is_finite() || self.income_lpa <= 0.0 {
            errors.push(format!(
                "incomeLpa must be greater than 0, got {}",
                self.income_lpa
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Look up a feature by the column name the model was trained with.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<FeatureValue> {
        match name {
            "bmi" => Some(FeatureValue::Number(self.bmi)),
            "age_group" => Some(FeatureValue::Category(self.age_group.as_str())),
            "lifestyle_risk" => Some(FeatureValue::Category(self.lifestyle_risk.as_str())),
            "city_tier" => Some(FeatureValue::Number(f64::from(self.city_tier))),
            "income_lpa" => Some(FeatureValue::Number(self.income_lpa)),
            "occupation" => Some(FeatureValue::Category(self.occupation.as_str())),
            _ => None,
        }
    }
}

/// Errors raised by a classifier or while loading one.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not loaded")]
    NotLoaded,

    #[error("Model artifact error: {0}")]
    Artifact(String),

    #[error("Model shape mismatch: {0}")]
    Shape(String),

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Feature {0} has the wrong type")]
    FeatureType(String),

    #[error("Model produced non-finite output")]
    NonFinite,
}

/// Response body for a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub predicted_category: String,
    /// Highest class probability, rounded to 4 places
    pub confidence: f64,
    pub class_probabilities: BTreeMap<String, f64>,
}

impl Prediction {
    /// Build a prediction from the model's label and per-class probabilities.
    ///
    /// # Errors
    /// Returns `ModelError::Shape` if labels and probabilities differ in length,
    /// or `ModelError::NonFinite` if a probability is not finite.
    pub fn from_probabilities(
        predicted_category: String,
        labels: &[String],
        probabilities: &[f64],
    ) -> Result<Self, ModelError> {
        if labels.len() != probabilities.len() || labels.is_empty() {
            return Err(ModelError::Shape(format!(
                "{} labels but {} probabilities",
                labels.len(),
                probabilities.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let confidence = probabilities.iter().copied().fold(f64::MIN, f64::max);
        let class_probabilities = labels
            .iter()
            .zip(probabilities)
            .map(|(label, p)| (label.clone(), round_to(*p, 4)))
            .collect();

        Ok(Self {
            predicted_category,
            confidence: round_to(confidence, 4),
            class_probabilities,
        })
    }
}

/// Outcome recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Error,
}

impl AuditStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only row per prediction attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub latency_ms: f64,
    /// `None` when the prediction failed
    pub predicted_category: Option<String>,
    pub model_version: String,
    pub status: AuditStatus,
}

impl AuditRecord {
    /// Record a prediction attempt that just finished.
    #[must_use]
    pub fn new(
        outcome: Result<&Prediction, &ModelError>,
        latency_ms: f64,
        model_version: impl Into<String>,
    ) -> Self {
        let (predicted_category, status) = match outcome {
            Ok(prediction) => (
                Some(prediction.predicted_category.clone()),
                AuditStatus::Success,
            ),
            Err(_) => (None, AuditStatus::Error),
        };

        Self {
            timestamp: chrono::Utc::now(),
            latency_ms,
            predicted_category,
            model_version: model_version.into(),
            status,
        }
    }
}
