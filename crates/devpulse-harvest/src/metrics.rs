//! Window metrics computed from GitHub list endpoints.
//!
//! Each fetcher pairs a thin API call with a pure computation over the raw
//! records, so the math is testable without a network.

use chrono::{DateTime, Duration, Utc};
use devpulse_core::{HarvestMetrics, PulseError};
use devpulse_metrics::rates::{ratio, round2};

use crate::client::GitHubClient;
use crate::records::{
    hours_between, CommentRecord, IssueRecord, PullRecord, ReviewRecord, WorkflowRunsPage,
};

/// Pull-request throughput over a window, plus the PR lists downstream
/// fetchers sample from.
#[derive(Debug, Clone)]
pub struct PrThroughput {
    /// PRs opened in the window.
    pub total_prs: u64,
    /// Every PR opened in the window; review latency samples all of them,
    /// merged or not.
    pub window: Vec<PullRecord>,
    /// Merged PRs, kept for the per-PR change-event fetch.
    pub merged: Vec<PullRecord>,
    /// Merged / total as a percentage.
    pub throughput_percent: f64,
}

/// The start of a reporting window `since_days` before now.
pub fn window_start(since_days: u64) -> DateTime<Utc> {
    Utc::now() - Duration::days(since_days as i64)
}

/// Compute throughput from an already-fetched PR list.
pub fn throughput_from(prs: Vec<PullRecord>) -> PrThroughput {
    let total_prs = prs.len() as u64;
    let merged: Vec<PullRecord> = prs
        .iter()
        .filter(|pr| pr.merged_at.is_some())
        .cloned()
        .collect();
    PrThroughput {
        total_prs,
        throughput_percent: ratio(merged.len() as u64, total_prs),
        window: prs,
        merged,
    }
}

/// Mean hours from PR creation to first feedback over `(pr, first_feedback)`
/// samples; `None` when no sampled PR got any feedback.
pub fn review_latency_hours_from(
    samples: &[(&PullRecord, Option<DateTime<Utc>>)],
) -> Option<f64> {
    let latencies: Vec<f64> = samples
        .iter()
        .filter_map(|(pr, feedback)| feedback.map(|t| hours_between(pr.created_at, t)))
        .collect();
    mean(&latencies).map(round2)
}

/// Mean hours from PR creation to merge over merged PRs; `None` when no PR merged.
pub fn cycle_time_hours_from(prs: &[PullRecord]) -> Option<f64> {
    let durations: Vec<f64> = prs
        .iter()
        .filter_map(|pr| pr.merged_at.map(|merged| hours_between(pr.created_at, merged)))
        .collect();
    mean(&durations).map(round2)
}

/// Mean hours from incident creation to close; `None` when no incident closed.
pub fn mttr_hours_from(issues: &[IssueRecord]) -> Option<f64> {
    let durations: Vec<f64> = issues
        .iter()
        .filter_map(|issue| issue.closed_at.map(|closed| hours_between(issue.created_at, closed)))
        .collect();
    mean(&durations).map(round2)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

impl GitHubClient {
    /// PRs opened in the window, with merged/total throughput.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on API errors.
    pub async fn fetch_pr_throughput(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
        max_pages: u32,
    ) -> Result<PrThroughput, PulseError> {
        let route = format!("/repos/{owner}/{repo}/pulls");
        let query = [
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        let prs: Vec<PullRecord> = self
            .list_recent(&route, &query, since, max_pages, |pr: &PullRecord| {
                pr.created_at
            })
            .await?;
        Ok(throughput_from(prs))
    }

    /// Mean hours from PR creation to the first review, falling back to the
    /// first issue comment. Samples every PR opened in the window, merged or
    /// not; PRs with no feedback are skipped, and no feedback at all yields 0.0.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on API errors.
    pub async fn fetch_review_latency(
        &self,
        owner: &str,
        repo: &str,
        prs: &[PullRecord],
    ) -> Result<f64, PulseError> {
        let mut samples = Vec::new();

        for pr in prs {
            let reviews_route = format!("/repos/{owner}/{repo}/pulls/{}/reviews", pr.number);
            let reviews: Vec<ReviewRecord> = self.get_page(&reviews_route, &[], 1).await?;

            let first_feedback = match reviews.iter().find_map(|r| r.submitted_at) {
                Some(t) => Some(t),
                None => {
                    let comments_route =
                        format!("/repos/{owner}/{repo}/issues/{}/comments", pr.number);
                    let comments: Vec<CommentRecord> =
                        self.get_page(&comments_route, &[], 1).await?;
                    comments.first().map(|c| c.created_at)
                }
            };

            samples.push((pr, first_feedback));
        }

        Ok(review_latency_hours_from(&samples).unwrap_or(0.0))
    }

    /// Count of workflow runs that concluded in failure.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on API errors.
    pub async fn fetch_ci_failures(
        &self,
        owner: &str,
        repo: &str,
        max_pages: u32,
    ) -> Result<u64, PulseError> {
        let route = format!("/repos/{owner}/{repo}/actions/runs");
        let mut failed = 0u64;
        for page in 1..=max_pages {
            let runs: WorkflowRunsPage = self.get_page(&route, &[], page).await?;
            if runs.workflow_runs.is_empty() {
                break;
            }
            failed += runs
                .workflow_runs
                .iter()
                .filter(|run| run.conclusion.as_deref() == Some("failure"))
                .count() as u64;
        }
        Ok(failed)
    }

    /// Mean time to recovery from incident-labeled issues closed in the window.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on API errors.
    pub async fn fetch_mttr(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
        max_pages: u32,
    ) -> Result<Option<f64>, PulseError> {
        let route = format!("/repos/{owner}/{repo}/issues");
        let query = [
            ("state", "closed".to_string()),
            ("labels", "incident".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        let issues: Vec<IssueRecord> = self
            .list_recent(&route, &query, since, max_pages, |issue: &IssueRecord| {
                issue.created_at
            })
            .await?;
        Ok(mttr_hours_from(&issues))
    }

    /// All window metrics in one pass: throughput, latency, cycle time, CI
    /// failures, and MTTR. Also returns the merged PRs for event fan-out.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] on API errors.
    pub async fn fetch_window_metrics(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
        max_pages: u32,
    ) -> Result<(HarvestMetrics, Vec<PullRecord>), PulseError> {
        let throughput = self
            .fetch_pr_throughput(owner, repo, since, max_pages)
            .await?;
        let review_latency = self
            .fetch_review_latency(owner, repo, &throughput.window)
            .await?;
        let ci_failures = self.fetch_ci_failures(owner, repo, max_pages).await?;
        let mttr_hours = self.fetch_mttr(owner, repo, since, max_pages).await?;

        let cycle_hours = cycle_time_hours_from(&throughput.merged).unwrap_or(0.0);

        let metrics = HarvestMetrics {
            total_prs: throughput.total_prs,
            merged_prs: throughput.merged.len() as u64,
            throughput_percent: throughput.throughput_percent,
            avg_review_latency_hours: review_latency,
            avg_cycle_time_hours: cycle_hours,
            avg_cycle_time_days: round2(cycle_hours / 24.0),
            ci_failures: Some(ci_failures),
            mttr_hours,
        };
        Ok((metrics, throughput.merged))
    }
}
