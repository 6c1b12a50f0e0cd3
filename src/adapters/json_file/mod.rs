//! JSON file adapter: Implementation of PatientStore.
//!
//! The whole store lives in one human-readable JSON object keyed by patient
//! id. Loads read the full file; saves write a sibling temporary file and
//! rename it over the target, so readers never see a partial store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::PatientMap;
use crate::ports::PatientStore;

/// Error type for record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Store {path:?} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Flat-file patient store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the store file at `path`. The file is not touched until the first load.
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Use the store file at `path`, creating an empty store if it is missing.
    ///
    /// # Errors
    /// Returns `StorageError::Unavailable` if the file cannot be created.
    pub fn open_or_init<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let store = Self::new(path);
        if !store.path.exists() {
            if let Some(parent) = store.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| store.unavailable(e))?;
                }
            }
            store.save(&PatientMap::new())?;
            tracing::info!("Initialized empty patient store at {:?}", store.path);
        }
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, source: std::io::Error) -> StorageError {
        StorageError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl PatientStore for JsonFileStore {
    type Error = StorageError;

    fn load(&self) -> Result<PatientMap, Self::Error> {
        let bytes = fs::read(&self.path).map_err(|e| self.unavailable(e))?;
        let patients: PatientMap =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Loaded {} patients from {:?}", patients.len(), self.path);
        Ok(patients)
    }

    fn save(&self, patients: &PatientMap) -> Result<(), Self::Error> {
        let bytes = serde_json::to_vec_pretty(patients).map_err(StorageError::Encode)?;

        let temp = self.temp_path();
        if let Err(e) = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(self.unavailable(e));
        }

        tracing::debug!("Saved {} patients to {:?}", patients.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, PatientRecord, Verdict};
    use tempfile::tempdir;

    fn record(weight: f64) -> PatientRecord {
        let mut r = PatientRecord {
            name: "Test".into(),
            city: "Delhi".into(),
            age: 30,
            gender: Gender::Male,
            height: 1.8,
            weight,
            bmi: None,
            verdict: None,
            extra: serde_json::Map::new(),
        };
        r.refresh_metrics().expect("valid");
        r
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("patients.json"));

        let mut patients = PatientMap::new();
        patients.insert("P001".into(), record(70.0));
        patients.insert("P002".into(), record(100.0));
        store.save(&patients).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, patients);
        assert_eq!(loaded["P002"].verdict, Some(Verdict::Obese));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.load(),
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("patients.json");
        std::fs::write(&path, "{ not json").expect("write");

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("patients.json");
        std::fs::write(&path, r#"{"P001": {"name": "x"}}"#).expect("write");

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_open_or_init_creates_empty_store() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("patients.json");

        let store = JsonFileStore::open_or_init(&path).expect("init");
        assert!(path.exists());
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn test_open_or_init_keeps_existing_store() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("patients.json");
        let mut patients = PatientMap::new();
        patients.insert("P001".into(), record(70.0));
        JsonFileStore::new(&path).save(&patients).expect("save");

        let store = JsonFileStore::open_or_init(&path).expect("open");
        assert_eq!(store.load().expect("load").len(), 1);
    }

    #[test]
    fn test_save_to_missing_directory_is_unavailable() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("missing").join("patients.json"));
        assert!(matches!(
            store.save(&PatientMap::new()),
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("patients.json");
        // A directory in the store's place makes the final rename fail.
        std::fs::create_dir(&path).expect("mkdir");

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.save(&PatientMap::new()),
            Err(StorageError::Unavailable { .. })
        ));
        assert!(!store.temp_path().exists());
    }
}
