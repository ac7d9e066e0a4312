//! Presentation ordering of per-author rollups.

use devpulse_core::AuthorRollup;

/// Sort rollups by total churn (additions + deletions) descending.
///
/// The sort is stable: authors with equal churn keep their first-encounter
/// order. Zero-activity authors are retained; filtering is the caller's
/// decision.
///
/// # Examples
///
/// ```
/// use devpulse_core::AuthorRollup;
/// use devpulse_metrics::ranking::rank_authors;
///
/// let mut bob = AuthorRollup::new("bob");
/// bob.additions = 500;
/// let alice = AuthorRollup::new("alice");
///
/// let ranked = rank_authors(vec![alice, bob]);
/// assert_eq!(ranked[0].author, "bob");
/// assert_eq!(ranked[1].author, "alice");
/// ```
pub fn rank_authors(mut rollups: Vec<AuthorRollup>) -> Vec<AuthorRollup> {
    rollups.sort_by_key(|r| std::cmp::Reverse(r.churn()));
    rollups
}
