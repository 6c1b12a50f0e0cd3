//! Body-mass metrics derived from stored height and weight.
//!
//! These values are never accepted from callers. Every write path runs
//! [`derive_metrics`] so a persisted record always matches its measurements.

use serde::{Deserialize, Serialize};

/// BMI bucket for a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// bmi < 18.5
    Underweight,
    /// 18.5 <= bmi < 25
    Normal,
    /// 25 <= bmi < 30
    Overweight,
    /// bmi >= 30
    Obese,
}

impl Verdict {
    /// Bucket a (rounded) BMI value. Lower bounds are inclusive.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Derived fields stored alongside a patient record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    /// weight / height^2, rounded to 2 decimal places
    pub bmi: f64,
    pub verdict: Verdict,
}

/// Rejected measurements.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("height must be a positive number of meters, got {0}")]
    InvalidHeight(f64),

    #[error("weight must be a positive number of kilograms, got {0}")]
    InvalidWeight(f64),
}

/// Compute BMI and verdict from height (m) and weight (kg).
///
/// # Errors
/// Returns `MetricsError` if either measurement is not a finite positive number.
pub fn derive_metrics(height: f64, weight: f64) -> Result<BodyMetrics, MetricsError> {
    if !height.is_finite() || height <= 0.0 {
        return Err(MetricsError::InvalidHeight(height));
    }
    if !weight.is_finite() || weight <= 0.0 {
        return Err(MetricsError::InvalidWeight(weight));
    }

    let bmi = round_to(weight / (height * height), 2);
    Ok(BodyMetrics {
        bmi,
        verdict: Verdict::from_bmi(bmi),
    })
}

/// Round to `places` decimal places.
///
/// Rounds the exact binary value with ties to even, so `25.125` becomes
/// `25.12`. Float formatting already does exact decimal rounding.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
