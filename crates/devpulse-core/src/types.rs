use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized unit of contribution produced by the harvester.
///
/// Usually one merged pull request; the harvester may also emit per-commit
/// events when a change never went through a PR. Missing numeric fields
/// default to zero so partially-populated upstream records never fail.
///
/// # Examples
///
/// ```
/// use devpulse_core::ChangeEvent;
///
/// let event: ChangeEvent = serde_json::from_str(r#"{"author": "alice"}"#).unwrap();
/// assert_eq!(event.additions, 0);
/// assert!(!event.ci_failed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Author login; `"unknown"` when the host does not report one.
    #[serde(default = "unknown_author")]
    pub author: String,
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deletions: u64,
    /// Files touched by the change, when the harvester fetched file details.
    #[serde(default)]
    pub files_changed: Option<u64>,
    /// Pull request number, if the change came from a PR.
    #[serde(default)]
    pub pr_number: Option<u64>,
    /// Commit SHA, used as identity when `pr_number` is absent.
    #[serde(default)]
    pub commit_sha: Option<String>,
    /// Whether CI failed for this change.
    #[serde(default)]
    pub ci_failed: bool,
}

fn unknown_author() -> String {
    "unknown".into()
}

impl ChangeEvent {
    /// Total lines changed (additions + deletions).
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }

    /// Presentation identity: `"PR #<n>"` when a PR number exists, else the
    /// commit SHA. `None` when the event carries neither.
    pub fn identity(&self) -> Option<String> {
        match (self.pr_number, &self.commit_sha) {
            (Some(n), _) => Some(format!("PR #{n}")),
            (None, Some(sha)) => Some(sha.clone()),
            (None, None) => None,
        }
    }
}

/// Accumulated contribution statistics for one author.
///
/// Built fresh on each pipeline run. The sum of per-author additions across
/// all rollups equals the total additions over the event sequence.
///
/// # Examples
///
/// ```
/// use devpulse_core::AuthorRollup;
///
/// let rollup = AuthorRollup::new("alice");
/// assert_eq!(rollup.additions, 0);
/// assert_eq!(rollup.churn(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRollup {
    /// Author login (case-sensitive exact identity).
    pub author: String,
    /// Total lines added by this author.
    pub additions: u64,
    /// Total lines deleted by this author.
    pub deletions: u64,
    /// Total files touched, summed over events that reported file counts.
    pub files_touched: u64,
}

impl AuthorRollup {
    /// Create a zeroed rollup for an author.
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            additions: 0,
            deletions: 0,
            files_touched: 0,
        }
    }

    /// Total churn for this author (additions + deletions).
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// A change event whose churn is statistically anomalous for the run.
///
/// # Examples
///
/// ```
/// use devpulse_core::ChurnOutlier;
///
/// let outlier = ChurnOutlier {
///     id: "PR #42".into(),
///     author: "alice".into(),
///     additions: 9000,
///     deletions: 1000,
///     files_changed: Some(120),
///     lines_changed: 10000,
///     z_score: 2.94,
/// };
/// assert!(outlier.z_score > 2.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnOutlier {
    /// Identity: `"PR #<n>"` or a commit SHA. Unique within a run.
    pub id: String,
    /// Author of the flagged change.
    pub author: String,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Files touched, when known.
    pub files_changed: Option<u64>,
    /// Total lines changed.
    pub lines_changed: u64,
    /// Z-score of the churn relative to the run population, rounded to 2 dp.
    pub z_score: f64,
}

/// Scalar rollups over the full event sequence.
///
/// # Examples
///
/// ```
/// use devpulse_core::AggregateMetrics;
///
/// let totals = AggregateMetrics::default();
/// assert_eq!(totals.total_additions, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    /// Lines added across all events.
    pub total_additions: u64,
    /// Lines deleted across all events.
    pub total_deletions: u64,
    /// CI failure count: the harvester's value when it supplied one,
    /// otherwise derived from per-event `ci_failed` flags.
    pub ci_failures: u64,
}

/// Metrics the harvester precomputes from API endpoints the analyst never
/// sees (PR listings, reviews, workflow runs, incident issues).
///
/// The analyst passes these through unmodified; it never recomputes them
/// from change events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestMetrics {
    /// Pull requests opened in the window.
    pub total_prs: u64,
    /// Pull requests merged in the window.
    pub merged_prs: u64,
    /// Merged / total PRs as a percentage, rounded to 2 dp.
    pub throughput_percent: f64,
    /// Mean hours from PR creation to first review or comment.
    pub avg_review_latency_hours: f64,
    /// Mean hours from PR creation to merge.
    pub avg_cycle_time_hours: f64,
    /// `avg_cycle_time_hours / 24`, rounded to 2 dp.
    pub avg_cycle_time_days: f64,
    /// CI failure count from workflow runs; `None` when not fetched.
    pub ci_failures: Option<u64>,
    /// Mean hours from incident creation to close; `None` when no incidents.
    pub mttr_hours: Option<f64>,
}

/// Full output of one pipeline run, handed to the narrator and the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    /// Scalar totals over the event sequence.
    pub totals: AggregateMetrics,
    /// Per-author rollups, ranked by total churn descending.
    pub authors: Vec<AuthorRollup>,
    /// Churn outliers, sorted by z-score descending.
    pub outliers: Vec<ChurnOutlier>,
    /// Pass-through metrics from the harvester.
    pub harvest: HarvestMetrics,
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
}

/// Output format for CLI results.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use devpulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary (default).
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_defaults_tolerate_sparse_records() {
        let event: ChangeEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.author, "unknown");
        assert_eq!(event.additions, 0);
        assert_eq!(event.deletions, 0);
        assert!(event.files_changed.is_none());
        assert!(event.pr_number.is_none());
        assert!(!event.ci_failed);
    }

    #[test]
    fn identity_prefers_pr_number() {
        let event = ChangeEvent {
            author: "alice".into(),
            additions: 1,
            deletions: 0,
            files_changed: None,
            pr_number: Some(7),
            commit_sha: Some("abc123".into()),
            ci_failed: false,
        };
        assert_eq!(event.identity().as_deref(), Some("PR #7"));
    }

    #[test]
    fn identity_falls_back_to_sha() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"author": "bob", "commitSha": "abc123"}"#).unwrap();
        assert_eq!(event.identity().as_deref(), Some("abc123"));
    }

    #[test]
    fn identity_absent_when_no_pr_and_no_sha() {
        let event: ChangeEvent = serde_json::from_str("{}").unwrap();
        assert!(event.identity().is_none());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = ActivityReport {
            totals: AggregateMetrics::default(),
            authors: vec![AuthorRollup::new("alice")],
            outliers: vec![],
            harvest: HarvestMetrics::default(),
            generated_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("totalAdditions").is_none());
        assert!(json["totals"].get("totalAdditions").is_some());
        assert_eq!(json["authors"][0]["filesTouched"], 0);
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
