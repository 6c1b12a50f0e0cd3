//! Patient record types for the record store.
//!
//! The store keys records by patient id, so [`PatientRecord`] carries every
//! field except the id. [`Patient`] is the full create payload and
//! [`PatientPatch`] the partial update payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::metrics::{derive_metrics, MetricsError, Verdict};

/// Whole-store snapshot: patient id to record.
pub type PatientMap = BTreeMap<String, PatientRecord>;

/// Exclusive lower bound for age in years.
pub const MIN_AGE: i64 = 0;

/// Exclusive upper bound for age in years.
pub const MAX_AGE: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "male")]
    Male,
    #[serde(alias = "female")]
    Female,
    #[serde(alias = "other")]
    Other,
}

/// Persisted patient fields (everything but the id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: Gender,
    /// Height in meters; 0 when the stored record lacks it
    #[serde(default)]
    pub height: f64,
    /// Weight in kilograms; 0 when the stored record lacks it
    #[serde(default)]
    pub weight: f64,
    /// Absent only in files written by other tools; filled on every write.
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    /// Keys this service does not know, kept so a save writes them back.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PatientRecord {
    /// Recompute `bmi` and `verdict` from the current height and weight.
    ///
    /// # Errors
    /// Returns `MetricsError` if height or weight is not positive.
    pub fn refresh_metrics(&mut self) -> Result<(), MetricsError> {
        let metrics = derive_metrics(self.height, self.weight)?;
        self.bmi = Some(metrics.bmi);
        self.verdict = Some(metrics.verdict);
        Ok(())
    }

    /// Check every stored field against its constraint.
    ///
    /// # Errors
    /// Returns all violations found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_text(&mut errors, "name", &self.name);
        check_text(&mut errors, "city", &self.city);
        check_age(&mut errors, self.age);
        check_positive(&mut errors, "height", self.height);
        check_positive(&mut errors, "weight", self.weight);
        into_result(errors)
    }

    /// Value used by the sort operation; missing derived values count as 0.
    #[must_use]
    pub fn sort_value(&self, field: SortField) -> f64 {
        match field {
            SortField::Height => self.height,
            SortField::Weight => self.weight,
            SortField::Bmi => self.bmi.unwrap_or(0.0),
        }
    }
}

/// Create payload: a full patient including its id.
///
/// Derived fields in the payload are ignored; they are always recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
}

impl Patient {
    /// Validate and split into the storage key and a record with fresh metrics.
    ///
    /// # Errors
    /// Returns all field violations found.
    pub fn into_entry(self) -> Result<(String, PatientRecord), Vec<String>> {
        let mut errors = Vec::new();
        check_text(&mut errors, "id", &self.id);

        let mut record = PatientRecord {
            name: self.name,
            city: self.city,
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
            bmi: None,
            verdict: None,
            extra: serde_json::Map::new(),
        };
        if let Err(mut field_errors) = record.validate() {
            errors.append(&mut field_errors);
        }
        into_result(errors)?;

        record.refresh_metrics().map_err(|e| vec![e.to_string()])?;
        Ok((self.id, record))
    }
}

/// Partial update payload.
///
/// Each field is `None` when absent, `Some(None)` when sent as `null` and
/// `Some(Some(v))` when sent with a value. Only the last form changes the
/// stored record; `null` cannot clear a field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<Gender>>,
    #[serde(default, deserialize_with = "present")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub weight: Option<Option<f64>>,
}

impl PatientPatch {
    /// Validate the non-null values carried by this patch.
    ///
    /// # Errors
    /// Returns all violations found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(name) = value(&self.name) {
            check_text(&mut errors, "name", name);
        }
        if let Some(city) = value(&self.city) {
            check_text(&mut errors, "city", city);
        }
        if let Some(&age) = value(&self.age) {
            check_age(&mut errors, age);
        }
        if let Some(&height) = value(&self.height) {
            check_positive(&mut errors, "height", height);
        }
        if let Some(&weight) = value(&self.weight) {
            check_positive(&mut errors, "weight", weight);
        }
        into_result(errors)
    }

    /// Overwrite the fields this patch carries a value for, then recompute
    /// the derived fields regardless of which fields changed.
    ///
    /// # Errors
    /// Returns `MetricsError` if the merged measurements are invalid.
    pub fn apply(&self, record: &mut PatientRecord) -> Result<(), MetricsError> {
        if let Some(name) = value(&self.name) {
            record.name.clone_from(name);
        }
        if let Some(city) = value(&self.city) {
            record.city.clone_from(city);
        }
        if let Some(&age) = value(&self.age) {
            record.age = age;
        }
        if let Some(&gender) = value(&self.gender) {
            record.gender = gender;
        }
        if let Some(&height) = value(&self.height) {
            record.height = height;
        }
        if let Some(&weight) = value(&self.weight) {
            record.weight = weight;
        }
        record.refresh_metrics()
    }
}

/// A record paired with its id, as returned by the sort operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientEntry {
    pub id: String,
    #[serde(flatten)]
    pub record: PatientRecord,
}

/// Field a sort request may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" => Ok(Self::Height),
            "weight" => Ok(Self::Weight),
            "bmi" => Ok(Self::Bmi),
            _ => Err("Invalid field select from ['height', 'weight', 'bmi']".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err("Invalid order select between asc and desc".to_string()),
        }
    }
}

/// Keep explicit `null` distinguishable from an absent field.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn value<T>(field: &Option<Option<T>>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

fn check_text(errors: &mut Vec<String>, field: &str, v: &str) {
    if v.trim().is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
}

fn check_age(errors: &mut Vec<String>, age: i64) {
    if age <= MIN_AGE || age >= MAX_AGE {
        errors.push(format!("age {age} out of range ({MIN_AGE}, {MAX_AGE})"));
    }
}

fn check_positive(errors: &mut Vec<String>, field: &str, v: f64) {
    if !v.is_finite() || v <= 0.0 {
        errors.push(format!("{field} must be greater than 0, got {v}"));
    }
}

fn into_result(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
