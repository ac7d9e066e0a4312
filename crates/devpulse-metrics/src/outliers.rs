//! Statistical churn-outlier detection.
//!
//! Flags change events whose churn sits more than a z-score threshold above
//! the run's population mean. Degenerate populations (fewer than two events,
//! or zero variance) never flag anything.

use std::collections::HashSet;

use devpulse_core::{ChangeEvent, ChurnOutlier};

use crate::rates::round2;

/// Detect events with anomalously high churn.
///
/// Uses a one-sided test: `(churn - mean) / stdev > z_threshold`, with the
/// sample standard deviation (n-1 denominator). Events below the mean are
/// never flagged. Results are deduplicated by identity (PR number, falling
/// back to commit SHA) and sorted by z-score descending; ties keep encounter
/// order. Events carrying neither identity are skipped, since there is
/// nothing stable to report them by.
///
/// # Examples
///
/// ```
/// use devpulse_core::ChangeEvent;
/// use devpulse_metrics::outliers::detect_outliers;
///
/// let events: Vec<ChangeEvent> = (1..=9)
///     .map(|n| {
///         serde_json::from_value(serde_json::json!({
///             "author": "a", "additions": 50 + n, "deletions": 0, "prNumber": n,
///         }))
///         .unwrap()
///     })
///     .chain(std::iter::once(
///         serde_json::from_value(serde_json::json!({
///             "author": "b", "additions": 2000, "deletions": 0, "prNumber": 10,
///         }))
///         .unwrap(),
///     ))
///     .collect();
/// let outliers = detect_outliers(&events, 2.0);
/// assert_eq!(outliers.len(), 1);
/// assert_eq!(outliers[0].id, "PR #10");
/// ```
pub fn detect_outliers(events: &[ChangeEvent], z_threshold: f64) -> Vec<ChurnOutlier> {
    if events.len() < 2 {
        return Vec::new();
    }

    let churns: Vec<f64> = events.iter().map(|e| e.churn() as f64).collect();
    let mean = churns.iter().sum::<f64>() / churns.len() as f64;
    let stdev = sample_stdev(&churns, mean);
    if stdev <= 0.0 {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut outliers: Vec<ChurnOutlier> = Vec::new();

    for (event, churn) in events.iter().zip(&churns) {
        let z = (churn - mean) / stdev;
        if z <= z_threshold {
            continue;
        }
        let Some(id) = event.identity() else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        outliers.push(ChurnOutlier {
            id,
            author: event.author.clone(),
            additions: event.additions,
            deletions: event.deletions,
            files_changed: event.files_changed,
            lines_changed: event.churn(),
            z_score: round2(z),
        });
    }

    outliers.sort_by(|a, b| {
        b.z_score
            .partial_cmp(&a.z_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    outliers
}

fn sample_stdev(values: &[f64], mean: f64) -> f64 {
    // Caller guarantees len >= 2.
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(author: &str, additions: u64, deletions: u64, pr: Option<u64>) -> ChangeEvent {
        ChangeEvent {
            author: author.into(),
            additions,
            deletions,
            files_changed: None,
            pr_number: pr,
            commit_sha: None,
            ci_failed: false,
        }
    }

    #[test]
    fn flags_only_the_extreme_event() {
        // Nine modest events and one giant one. With the sample standard
        // deviation, a population this size puts the giant event past z = 2
        // while keeping every modest event below the mean.
        let churns = [50u64, 60, 55, 45, 48, 52, 47, 53, 49, 2000];
        let events: Vec<ChangeEvent> = churns
            .iter()
            .enumerate()
            .map(|(i, &c)| event("dev", c, 0, Some(i as u64 + 1)))
            .collect();

        let outliers = detect_outliers(&events, 2.0);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].id, "PR #10");
        assert_eq!(outliers[0].lines_changed, 2000);
        assert!(outliers[0].z_score > 2.0);
    }

    #[test]
    fn small_population_caps_the_z_score() {
        // With n events, the sample z-score cannot exceed (n-1)/sqrt(n);
        // for five events that cap is ~1.79, so even an enormous spike
        // stays under a 2.0 threshold.
        let churns = [50u64, 60, 55, 45, 2000];
        let events: Vec<ChangeEvent> = churns
            .iter()
            .enumerate()
            .map(|(i, &c)| event("dev", c, 0, Some(i as u64 + 1)))
            .collect();
        assert!(detect_outliers(&events, 2.0).is_empty());
        assert_eq!(detect_outliers(&events, 1.5).len(), 1);
    }

    #[test]
    fn identical_churn_yields_no_outliers() {
        let events = vec![event("a", 100, 0, Some(1)), event("b", 100, 0, Some(2))];
        assert!(detect_outliers(&events, 2.0).is_empty());
    }

    #[test]
    fn single_event_never_flags() {
        let events = vec![event("a", 1_000_000, 0, Some(1))];
        assert!(detect_outliers(&events, 2.0).is_empty());
    }

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(detect_outliers(&[], 2.0).is_empty());
    }

    #[test]
    fn duplicate_identity_is_flagged_once() {
        let mut events: Vec<ChangeEvent> = (0..20).map(|i| event("a", 50, 0, Some(i))).collect();
        // Two raw events for the same PR, both far above the mean.
        events.push(event("b", 10_000, 0, Some(99)));
        events.push(event("b", 10_000, 0, Some(99)));

        let outliers = detect_outliers(&events, 2.0);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].id, "PR #99");
    }

    #[test]
    fn appending_a_huge_event_raises_its_z_and_flags_it() {
        let base: Vec<ChangeEvent> = (0..5).map(|i| event("a", 40 + i, 0, Some(i))).collect();
        assert!(detect_outliers(&base, 2.0).is_empty());

        let mut extended = base.clone();
        extended.push(event("b", 10_000, 0, Some(42)));
        let outliers = detect_outliers(&extended, 2.0);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].id, "PR #42");
    }

    #[test]
    fn events_below_the_mean_are_never_flagged() {
        // One tiny event far below an otherwise uniform population.
        let mut events: Vec<ChangeEvent> =
            (0..5).map(|i| event("a", 5000, 0, Some(i))).collect();
        events.push(event("b", 1, 0, Some(42)));
        let outliers = detect_outliers(&events, 2.0);
        assert!(outliers.iter().all(|o| o.id != "PR #42"));
    }

    #[test]
    fn identity_falls_back_to_commit_sha() {
        let mut events: Vec<ChangeEvent> = (0..9).map(|i| event("a", 50, 0, Some(i))).collect();
        let mut anon = event("b", 10_000, 0, None);
        anon.commit_sha = Some("deadbeef".into());
        events.push(anon);

        let outliers = detect_outliers(&events, 2.0);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].id, "deadbeef");
    }

    #[test]
    fn events_without_identity_are_skipped() {
        let mut events: Vec<ChangeEvent> = (0..9).map(|i| event("a", 50, 0, Some(i))).collect();
        events.push(event("b", 10_000, 0, None));
        assert!(detect_outliers(&events, 2.0).is_empty());
    }

    #[test]
    fn outliers_sort_by_z_descending() {
        let mut events: Vec<ChangeEvent> = (0..30).map(|i| event("a", 10, 0, Some(i))).collect();
        events.push(event("b", 5_000, 0, Some(100)));
        events.push(event("c", 6_000, 0, Some(101)));

        let outliers = detect_outliers(&events, 2.0);
        assert_eq!(outliers.len(), 2);
        assert_eq!(outliers[0].id, "PR #101");
        assert!(outliers[0].z_score >= outliers[1].z_score);
    }

    #[test]
    fn z_scores_are_rounded_to_two_decimals() {
        let mut events: Vec<ChangeEvent> = (0..6).map(|i| event("a", 33, 0, Some(i))).collect();
        events.push(event("b", 7_777, 0, Some(7)));
        let outliers = detect_outliers(&events, 2.0);
        for o in &outliers {
            assert_eq!(o.z_score, round2(o.z_score));
        }
    }
}
