//! Single-pass reduction of change events into totals and per-author rollups.

use std::collections::HashMap;

use devpulse_core::{AggregateMetrics, AuthorRollup, ChangeEvent};

/// Reduce an event sequence into scalar totals and per-author rollups.
///
/// Rollups are returned in first-encounter order; authors match by
/// case-sensitive exact string. When `upstream_ci_failures` is `Some`, that
/// count is authoritative and per-event `ci_failed` flags are ignored, so a
/// harvester that already counted workflow failures is never double-counted.
///
/// # Examples
///
/// ```
/// use devpulse_core::ChangeEvent;
/// use devpulse_metrics::aggregate::aggregate;
///
/// let events: Vec<ChangeEvent> = serde_json::from_str(
///     r#"[{"author": "alice", "additions": 100, "deletions": 20},
///         {"author": "alice", "additions": 30, "deletions": 5}]"#,
/// ).unwrap();
/// let (totals, rollups) = aggregate(&events, None);
/// assert_eq!(totals.total_additions, 130);
/// assert_eq!(rollups[0].deletions, 25);
/// ```
pub fn aggregate(
    events: &[ChangeEvent],
    upstream_ci_failures: Option<u64>,
) -> (AggregateMetrics, Vec<AuthorRollup>) {
    let mut totals = AggregateMetrics::default();
    let mut rollups: Vec<AuthorRollup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for event in events {
        totals.total_additions += event.additions;
        totals.total_deletions += event.deletions;
        if upstream_ci_failures.is_none() && event.ci_failed {
            totals.ci_failures += 1;
        }

        let slot = match index.get(event.author.as_str()) {
            Some(&i) => i,
            None => {
                rollups.push(AuthorRollup::new(&event.author));
                index.insert(event.author.as_str(), rollups.len() - 1);
                rollups.len() - 1
            }
        };
        let rollup = &mut rollups[slot];
        rollup.additions += event.additions;
        rollup.deletions += event.deletions;
        rollup.files_touched += event.files_changed.unwrap_or(0);
    }

    if let Some(count) = upstream_ci_failures {
        totals.ci_failures = count;
    }

    (totals, rollups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(author: &str, additions: u64, deletions: u64) -> ChangeEvent {
        ChangeEvent {
            author: author.into(),
            additions,
            deletions,
            files_changed: None,
            pr_number: None,
            commit_sha: None,
            ci_failed: false,
        }
    }

    #[test]
    fn per_author_rollups_accumulate_in_first_seen_order() {
        let events = vec![
            event("alice", 100, 20),
            event("bob", 50, 10),
            event("alice", 30, 5),
        ];
        let (totals, rollups) = aggregate(&events, None);

        assert_eq!(totals.total_additions, 180);
        assert_eq!(totals.total_deletions, 35);

        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].author, "alice");
        assert_eq!(rollups[0].additions, 130);
        assert_eq!(rollups[0].deletions, 25);
        assert_eq!(rollups[1].author, "bob");
        assert_eq!(rollups[1].additions, 50);
        assert_eq!(rollups[1].deletions, 10);
    }

    #[test]
    fn empty_input_yields_zero_totals_and_no_rollups() {
        let (totals, rollups) = aggregate(&[], None);
        assert_eq!(totals, AggregateMetrics::default());
        assert!(rollups.is_empty());
    }

    #[test]
    fn additions_are_conserved_across_rollups() {
        let events = vec![
            event("alice", 12, 3),
            event("bob", 7, 0),
            event("carol", 0, 9),
            event("alice", 1, 1),
        ];
        let (totals, rollups) = aggregate(&events, None);
        let rollup_additions: u64 = rollups.iter().map(|r| r.additions).sum();
        let rollup_deletions: u64 = rollups.iter().map(|r| r.deletions).sum();
        assert_eq!(rollup_additions, totals.total_additions);
        assert_eq!(rollup_deletions, totals.total_deletions);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let events = vec![event("alice", 5, 2), event("bob", 3, 3)];
        let first = aggregate(&events, None);
        let second = aggregate(&events, None);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn upstream_ci_count_wins_over_event_flags() {
        let mut failing = event("alice", 1, 1);
        failing.ci_failed = true;
        let events = vec![failing.clone(), failing];

        let (derived, _) = aggregate(&events, None);
        assert_eq!(derived.ci_failures, 2);

        let (upstream, _) = aggregate(&events, Some(9));
        assert_eq!(upstream.ci_failures, 9);
    }

    #[test]
    fn upstream_zero_is_still_authoritative() {
        let mut failing = event("alice", 1, 1);
        failing.ci_failed = true;
        let (totals, _) = aggregate(&[failing], Some(0));
        assert_eq!(totals.ci_failures, 0);
    }

    #[test]
    fn author_matching_is_case_sensitive() {
        let events = vec![event("Alice", 10, 0), event("alice", 5, 0)];
        let (_, rollups) = aggregate(&events, None);
        assert_eq!(rollups.len(), 2);
    }

    #[test]
    fn files_touched_sums_only_present_counts() {
        let mut with_files = event("alice", 1, 0);
        with_files.files_changed = Some(4);
        let without_files = event("alice", 1, 0);
        let (_, rollups) = aggregate(&[with_files, without_files], None);
        assert_eq!(rollups[0].files_touched, 4);
    }
}
