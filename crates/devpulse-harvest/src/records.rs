//! Raw GitHub API records and the pure predicates applied to them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A pull request as returned by the `/pulls` list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRecord {
    /// PR number.
    pub number: u64,
    /// When the PR was opened.
    pub created_at: DateTime<Utc>,
    /// When the PR was merged, if it was.
    pub merged_at: Option<DateTime<Utc>>,
    /// Opening user; GitHub omits it for deleted accounts.
    pub user: Option<UserRecord>,
}

/// The `user` object nested in PR and issue records.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    /// Account login.
    pub login: String,
}

/// A review from `/pulls/{n}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRecord {
    /// When the review was submitted; pending reviews have none.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An issue comment from `/issues/{n}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// One page of `/actions/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsPage {
    /// Runs on this page.
    pub workflow_runs: Vec<RunRecord>,
}

/// A single workflow run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRecord {
    /// Run conclusion (`"success"`, `"failure"`, ...); absent while running.
    pub conclusion: Option<String>,
}

/// A closed incident issue from `/issues?labels=incident`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    /// When the incident was opened.
    pub created_at: DateTime<Utc>,
    /// When the incident was closed.
    pub closed_at: Option<DateTime<Utc>>,
}

/// One file entry from `/pulls/{n}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrFileRecord {
    /// Lines added in this file.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted in this file.
    #[serde(default)]
    pub deletions: u64,
}

/// Whether a login looks like a bot account (`dependabot[bot]`, `renovate-bot`, ...).
///
/// # Examples
///
/// ```
/// use devpulse_harvest::records::is_bot_login;
///
/// assert!(is_bot_login("dependabot[bot]"));
/// assert!(!is_bot_login("alice"));
/// ```
pub fn is_bot_login(login: &str) -> bool {
    login.to_lowercase().contains("bot")
}

/// Elapsed hours between two instants, as a fraction.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
