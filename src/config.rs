//! Environment-driven configuration for the two servers.
//!
//! Values are read once at startup. Missing variables fall back to
//! defaults; malformed ones fail startup with [`HealthdeskError::Config`].

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::HealthdeskError;

pub const DEFAULT_RECORDS_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_STORE_PATH: &str = "patients.json";
pub const DEFAULT_PREDICT_ADDR: &str = "127.0.0.1:8001";
pub const DEFAULT_MODEL_PATH: &str = "models/premium_model.json";

/// Record API settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordsConfig {
    pub addr: SocketAddr,
    pub store_path: PathBuf,
    /// Create an empty store file at startup when none exists.
    pub init_store: bool,
}

impl RecordsConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    /// Returns `Config` for an unparseable address or flag.
    pub fn from_env() -> Result<Self, HealthdeskError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `Config` for an unparseable address or flag.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HealthdeskError> {
        Ok(Self {
            addr: parse_addr(
                "HEALTHDESK_RECORDS_ADDR",
                lookup("HEALTHDESK_RECORDS_ADDR").as_deref(),
                DEFAULT_RECORDS_ADDR,
            )?,
            store_path: lookup("HEALTHDESK_STORE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from),
            init_store: match lookup("HEALTHDESK_INIT_STORE") {
                Some(value) => parse_bool("HEALTHDESK_INIT_STORE", &value)?,
                None => true,
            },
        })
    }
}

/// Prediction API settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionConfig {
    pub addr: SocketAddr,
    pub model_path: PathBuf,
    /// SQLite audit database; auditing is off when unset.
    pub audit_db: Option<PathBuf>,
}

impl PredictionConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    /// Returns `Config` for an unparseable address.
    pub fn from_env() -> Result<Self, HealthdeskError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `Config` for an unparseable address.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HealthdeskError> {
        Ok(Self {
            addr: parse_addr(
                "HEALTHDESK_PREDICT_ADDR",
                lookup("HEALTHDESK_PREDICT_ADDR").as_deref(),
                DEFAULT_PREDICT_ADDR,
            )?,
            model_path: lookup("HEALTHDESK_MODEL_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from),
            audit_db: lookup("HEALTHDESK_AUDIT_DB")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_addr(key: &str, value: Option<&str>, default: &str) -> Result<SocketAddr, HealthdeskError> {
    let raw = value.unwrap_or(default);
    raw.trim()
        .parse()
        .map_err(|e| HealthdeskError::Config(format!("{key}={raw:?} is not a socket address: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, HealthdeskError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HealthdeskError::Config(format!(
            "{key}={value:?} is not a boolean"
        ))),
    }
}
