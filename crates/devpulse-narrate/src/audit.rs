//! Audit trail of delivered summaries.
//!
//! Every rendered summary is appended to a JSON-lines file so past reports
//! survive even when chat delivery fails or the database is wiped.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use devpulse_core::PulseError;
use serde::{Deserialize, Serialize};

/// One line in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// When the summary was produced.
    pub timestamp: DateTime<Utc>,
    /// The rendered summary text.
    pub summary: String,
}

/// Append a summary to the audit log at `path`.
///
/// The file is created on first use; each call appends exactly one JSON
/// line.
///
/// # Errors
///
/// Returns [`PulseError::Io`] if the file cannot be opened or written, or
/// [`PulseError::Serialization`] if the entry cannot be encoded.
pub fn append_summary(path: &Path, summary: &str) -> Result<(), PulseError> {
    let entry = AuditEntry {
        timestamp: Utc::now(),
        summary: summary.to_string(),
    };
    let line = serde_json::to_string(&entry)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}
