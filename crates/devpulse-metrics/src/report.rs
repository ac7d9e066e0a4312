//! Composition of the analysis stages into one [`ActivityReport`].

use chrono::Utc;
use devpulse_core::{ActivityReport, ChangeEvent, HarvestMetrics};

use crate::aggregate::aggregate;
use crate::outliers::detect_outliers;
use crate::ranking::rank_authors;

/// Run the full analysis pass over a finished event sequence.
///
/// One aggregation pass, one outlier pass, one ranking sort. The harvester's
/// precomputed metrics are threaded through unmodified; in particular its
/// CI-failure count, when present, wins over counting per-event flags.
///
/// # Examples
///
/// ```
/// use devpulse_core::HarvestMetrics;
/// use devpulse_metrics::analyze;
///
/// let report = analyze(&[], HarvestMetrics::default(), 2.0);
/// assert_eq!(report.totals.total_additions, 0);
/// assert!(report.authors.is_empty());
/// assert!(report.outliers.is_empty());
/// ```
pub fn analyze(
    events: &[ChangeEvent],
    harvest: HarvestMetrics,
    z_threshold: f64,
) -> ActivityReport {
    let (totals, rollups) = aggregate(events, harvest.ci_failures);
    let outliers = detect_outliers(events, z_threshold);
    let authors = rank_authors(rollups);

    ActivityReport {
        totals,
        authors,
        outliers,
        harvest,
        generated_at: Utc::now(),
    }
}
