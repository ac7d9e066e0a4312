//! Normalization of merged PRs into change events.
//!
//! Per-PR file details are fetched with a bounded concurrent fan-out; the
//! resulting event order follows the PR listing so downstream analysis is
//! deterministic.

use devpulse_core::{ChangeEvent, HarvestMetrics, PulseError};
use futures::stream::{self, StreamExt};

use crate::client::GitHubClient;
use crate::metrics::window_start;
use crate::records::{is_bot_login, PrFileRecord, PullRecord};

/// How many per-PR detail requests run at once.
const FAN_OUT: usize = 10;

/// Build one change event from a PR and its file listing.
///
/// Returns `None` for bot authors when `exclude_bots` is set. A missing
/// login maps to the `"unknown"` author sentinel.
pub fn pr_change_event(
    pr: &PullRecord,
    files: &[PrFileRecord],
    exclude_bots: bool,
) -> Option<ChangeEvent> {
    let author = pr
        .user
        .as_ref()
        .map(|u| u.login.clone())
        .unwrap_or_else(|| "unknown".into());
    if exclude_bots && is_bot_login(&author) {
        return None;
    }

    Some(ChangeEvent {
        author,
        additions: files.iter().map(|f| f.additions).sum(),
        deletions: files.iter().map(|f| f.deletions).sum(),
        files_changed: Some(files.len() as u64),
        pr_number: Some(pr.number),
        commit_sha: None,
        ci_failed: false,
    })
}

impl GitHubClient {
    /// Fetch file details for each merged PR and normalize into events.
    ///
    /// Runs up to [`FAN_OUT`] detail requests concurrently while preserving
    /// the input PR order.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] if any detail fetch fails.
    pub async fn fetch_change_events(
        &self,
        owner: &str,
        repo: &str,
        merged: &[PullRecord],
        exclude_bots: bool,
    ) -> Result<Vec<ChangeEvent>, PulseError> {
        let fetched: Vec<Result<(usize, Vec<PrFileRecord>), PulseError>> =
            stream::iter(merged.iter().enumerate())
                .map(|(i, pr)| async move {
                    let files = self.get_pr_files(owner, repo, pr.number).await?;
                    Ok((i, files))
                })
                .buffered(FAN_OUT)
                .collect()
                .await;

        let mut events = Vec::with_capacity(merged.len());
        for result in fetched {
            let (i, files) = result?;
            if let Some(event) = pr_change_event(&merged[i], &files, exclude_bots) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

/// Run the full harvest: window metrics plus the normalized event sequence.
///
/// # Errors
///
/// Returns [`PulseError::GitHub`] on API errors, or [`PulseError::Config`]
/// when the client has no token.
///
/// # Examples
///
/// ```no_run
/// use devpulse_harvest::{harvest, GitHubClient};
///
/// # async fn run() -> devpulse_core::Result<()> {
/// let client = GitHubClient::new(None)?;
/// let (events, metrics) = harvest(&client, "rust-lang", "rust", 7, 5, true).await?;
/// println!("{} events, {} PRs", events.len(), metrics.total_prs);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    since_days: u64,
    max_pages: u32,
    exclude_bots: bool,
) -> Result<(Vec<ChangeEvent>, HarvestMetrics), PulseError> {
    let since = window_start(since_days);
    let (metrics, merged) = client
        .fetch_window_metrics(owner, repo, since, max_pages)
        .await?;
    let events = client
        .fetch_change_events(owner, repo, &merged, exclude_bots)
        .await?;
    Ok((events, metrics))
}
