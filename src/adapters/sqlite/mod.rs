//! SQLite adapter: Implementation of AuditLog.
//!
//! Stores one `prediction_logs` row per prediction attempt. Rows are only
//! ever inserted; there is no update or delete path.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex is reported as
//! `AuditError::Poisoned` rather than a panic, since audit failures must never
//! take down the prediction path.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection};

use crate::domain::{AuditRecord, AuditStatus};
use crate::ports::AuditLog;

/// How long an append waits on a locked database before giving up.
pub const AUDIT_BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Error type for audit log operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Audit connection lock poisoned")]
    Poisoned,
}

/// SQLite audit log adapter.
pub struct SqliteAuditLog {
    conn: Mutex<Connection>,
}

impl SqliteAuditLog {
    /// Open (or create) the audit database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory audit database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, AuditError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AuditError> {
        // A locked database must not hold up the prediction response.
        conn.busy_timeout(AUDIT_BUSY_TIMEOUT)?;
        let log = Self {
            conn: Mutex::new(conn),
        };
        log.init_schema()?;
        Ok(log)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn.lock().map_err(|_| AuditError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), AuditError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS prediction_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                latency_ms REAL NOT NULL,
                prediction TEXT,
                model_version TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_prediction_logs_timestamp
                ON prediction_logs(timestamp DESC);
            ",
        )?;

        Ok(())
    }

    /// Load the most recent rows, newest first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT timestamp, latency_ms, prediction, model_version, status
            FROM prediction_logs
            ORDER BY id DESC
            LIMIT ?1
            ",
        )?;

        let records = stmt
            .query_map(params![limit as i64], |row| {
                let timestamp_str: String = row.get(0)?;
                let latency_ms: f64 = row.get(1)?;
                let predicted_category: Option<String> = row.get(2)?;
                let model_version: String = row.get(3)?;
                let status_str: String = row.get(4)?;

                let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .unwrap_or_else(|_| chrono::Utc::now());

                Ok(AuditRecord {
                    timestamp,
                    latency_ms,
                    predicted_category,
                    model_version,
                    status: Self::string_to_status(&status_str),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Count all rows.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn count(&self) -> Result<usize, AuditError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM prediction_logs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn string_to_status(s: &str) -> AuditStatus {
        match s {
            "success" => AuditStatus::Success,
            _ => AuditStatus::Error,
        }
    }
}

impl AuditLog for SqliteAuditLog {
    type Error = AuditError;

    fn append(&self, record: &AuditRecord) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;

        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction()?;
        tx.execute(
            r"
            INSERT INTO prediction_logs (
                timestamp, latency_ms, prediction, model_version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                record.timestamp.to_rfc3339(),
                record.latency_ms,
                record.predicted_category,
                record.model_version,
                record.status.as_str(),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            "Appended audit row (status={}, latency_ms={:.2})",
            record.status,
            record.latency_ms
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(category: Option<&str>, status: AuditStatus) -> AuditRecord {
        AuditRecord {
            timestamp: chrono::Utc::now(),
            latency_ms: 3.25,
            predicted_category: category.map(str::to_string),
            model_version: "1.0.0".into(),
            status,
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let log = SqliteAuditLog::in_memory().expect("Should create db");
        assert_eq!(log.count().expect("Should count"), 0);

        log.append(&record(Some("low"), AuditStatus::Success))
            .expect("Should append");
        log.append(&record(None, AuditStatus::Error))
            .expect("Should append");
        assert_eq!(log.count().expect("Should count"), 2);

        let rows = log.recent(10).expect("Should load");
        assert_eq!(rows.len(), 2);
        // newest first
        assert_eq!(rows[0].status, AuditStatus::Error);
        assert!(rows[0].predicted_category.is_none());
        assert_eq!(rows[1].predicted_category.as_deref(), Some("low"));
        assert!((rows[1].latency_ms - 3.25).abs() < f64::EPSILON);
        assert_eq!(rows[1].model_version, "1.0.0");
    }

    #[test]
    fn test_recent_respects_limit() {
        let log = SqliteAuditLog::in_memory().expect("Should create db");
        for _ in 0..5 {
            log.append(&record(Some("high"), AuditStatus::Success))
                .expect("Should append");
        }
        assert_eq!(log.recent(3).expect("Should load").len(), 3);
    }

    #[test]
    fn test_file_backed_log_persists() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("audit.db");

        {
            let log = SqliteAuditLog::new(&path).expect("Should open");
            log.append(&record(Some("medium"), AuditStatus::Success))
                .expect("Should append");
        }

        let reopened = SqliteAuditLog::new(&path).expect("Should reopen");
        assert_eq!(reopened.count().expect("Should count"), 1);
    }

    #[test]
    fn test_append_fails_without_table() {
        let log = SqliteAuditLog::in_memory().expect("Should create db");
        {
            let conn = log.lock().expect("lock");
            conn.execute_batch("DROP TABLE prediction_logs;")
                .expect("drop table");
        }
        assert!(log.append(&record(Some("low"), AuditStatus::Success)).is_err());
    }

    #[test]
    fn test_locked_database_fails_fast() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("audit.db");
        let log = SqliteAuditLog::new(&path).expect("Should open");

        let holder = Connection::open(&path).expect("Should open second connection");
        holder
            .execute_batch("BEGIN EXCLUSIVE;")
            .expect("Should lock");

        let started = std::time::Instant::now();
        assert!(log.append(&record(Some("high"), AuditStatus::Success)).is_err());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        holder.execute_batch("ROLLBACK;").expect("Should unlock");
        log.append(&record(Some("high"), AuditStatus::Success))
            .expect("Should append once unlocked");
    }
}
