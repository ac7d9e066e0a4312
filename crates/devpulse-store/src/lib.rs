//! SQLite persistence for generated reports.
//!
//! Each run writes one flat row to `dev_reports`: scalar metrics as columns,
//! the per-author and outlier breakdowns as JSON, plus the rendered summary.
//! History queries read the rows back newest first.

use std::path::Path;

use chrono::{DateTime, Utc};
use devpulse_core::{ActivityReport, AuthorRollup, ChurnOutlier, PulseError};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// A stored report row, as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    /// Row id, assigned by SQLite.
    pub id: i64,
    /// When the report was generated.
    pub timestamp: DateTime<Utc>,
    /// Total lines added across all events.
    pub total_additions: u64,
    /// Total lines removed across all events.
    pub total_deletions: u64,
    /// Pull requests opened in the window.
    pub total_prs: u64,
    /// Pull requests merged in the window.
    pub merged_prs: u64,
    /// Merge throughput as a percentage.
    pub pr_throughput: f64,
    /// Average review latency in hours.
    pub avg_review_latency: f64,
    /// Average cycle time in hours.
    pub avg_cycle_time: f64,
    /// CI failures counted in the window.
    pub ci_failures: u64,
    /// Mean time to recovery in hours, if incidents were found.
    pub mttr_hours: Option<f64>,
    /// Ranked per-author contribution rollups.
    pub per_author: Vec<AuthorRollup>,
    /// Flagged churn outliers.
    pub outliers: Vec<ChurnOutlier>,
    /// The rendered summary text that was delivered.
    pub summary: String,
}

/// SQLite-backed report store.
///
/// # Examples
///
/// ```
/// use devpulse_store::ReportStore;
///
/// let store = ReportStore::in_memory().unwrap();
/// assert!(store.recent(10).unwrap().is_empty());
/// ```
pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open or create a report database at the given path.
    ///
    /// Creates the table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Store`] if the database cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use devpulse_store::ReportStore;
    ///
    /// let store = ReportStore::open(Path::new("dev_reports.db")).unwrap();
    /// ```
    pub fn open(path: &Path) -> Result<Self, PulseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PulseError::Store(format!("failed to create database directory: {e}"))
                })?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| PulseError::Store(format!("failed to open database: {e}")))?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Store`] if schema creation fails.
    pub fn in_memory() -> Result<Self, PulseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PulseError::Store(format!("failed to create in-memory database: {e}")))?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), PulseError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS dev_reports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    total_additions INTEGER NOT NULL,
                    total_deletions INTEGER NOT NULL,
                    total_prs INTEGER NOT NULL,
                    merged_prs INTEGER NOT NULL,
                    pr_throughput REAL NOT NULL,
                    avg_review_latency REAL NOT NULL,
                    avg_cycle_time REAL NOT NULL,
                    ci_failures INTEGER NOT NULL,
                    mttr_hours REAL,
                    per_author TEXT NOT NULL,
                    outliers TEXT NOT NULL,
                    summary TEXT NOT NULL
                );
                ",
            )
            .map_err(|e| PulseError::Store(format!("failed to create schema: {e}")))?;

        Ok(())
    }

    /// Persist a report and its rendered summary; returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Store`] on insert failure, or
    /// [`PulseError::Serialization`] if the breakdowns cannot be encoded.
    pub fn save(&self, report: &ActivityReport, summary: &str) -> Result<i64, PulseError> {
        let per_author = serde_json::to_string(&report.authors)?;
        let outliers = serde_json::to_string(&report.outliers)?;

        self.conn
            .execute(
                "INSERT INTO dev_reports
                 (timestamp, total_additions, total_deletions, total_prs, merged_prs,
                  pr_throughput, avg_review_latency, avg_cycle_time, ci_failures,
                  mttr_hours, per_author, outliers, summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    report.generated_at.to_rfc3339(),
                    report.totals.total_additions,
                    report.totals.total_deletions,
                    report.harvest.total_prs,
                    report.harvest.merged_prs,
                    report.harvest.throughput_percent,
                    report.harvest.avg_review_latency_hours,
                    report.harvest.avg_cycle_time_hours,
                    report.totals.ci_failures,
                    report.harvest.mttr_hours,
                    per_author,
                    outliers,
                    summary,
                ],
            )
            .map_err(|e| PulseError::Store(format!("failed to insert report: {e}")))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Read the most recent reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Store`] on query failure.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredReport>, PulseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, total_additions, total_deletions, total_prs,
                        merged_prs, pr_throughput, avg_review_latency, avg_cycle_time,
                        ci_failures, mttr_hours, per_author, outliers, summary
                 FROM dev_reports
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(|e| PulseError::Store(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let timestamp: String = row.get(1)?;
                let per_author: String = row.get(11)?;
                let outliers: String = row.get(12)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    timestamp,
                    row.get::<_, u64>(2)?,
                    row.get::<_, u64>(3)?,
                    row.get::<_, u64>(4)?,
                    row.get::<_, u64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                    row.get::<_, f64>(8)?,
                    row.get::<_, u64>(9)?,
                    row.get::<_, Option<f64>>(10)?,
                    per_author,
                    outliers,
                    row.get::<_, String>(13)?,
                ))
            })
            .map_err(|e| PulseError::Store(format!("failed to query reports: {e}")))?;

        let mut reports = Vec::new();
        for row in rows {
            let (
                id,
                timestamp,
                total_additions,
                total_deletions,
                total_prs,
                merged_prs,
                pr_throughput,
                avg_review_latency,
                avg_cycle_time,
                ci_failures,
                mttr_hours,
                per_author,
                outliers,
                summary,
            ) = row.map_err(|e| PulseError::Store(format!("failed to read row: {e}")))?;

            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| PulseError::Store(format!("corrupted timestamp in row {id}: {e}")))?
                .with_timezone(&Utc);

            reports.push(StoredReport {
                id,
                timestamp,
                total_additions,
                total_deletions,
                total_prs,
                merged_prs,
                pr_throughput,
                avg_review_latency,
                avg_cycle_time,
                ci_failures,
                mttr_hours,
                per_author: serde_json::from_str(&per_author)?,
                outliers: serde_json::from_str(&outliers)?,
                summary,
            });
        }

        Ok(reports)
    }

    /// Count stored reports.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Store`] on query failure.
    pub fn count(&self) -> Result<u64, PulseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dev_reports", [], |row| row.get(0))
            .map_err(|e| PulseError::Store(format!("failed to count reports: {e}")))?;
        Ok(count as u64)
    }
}
