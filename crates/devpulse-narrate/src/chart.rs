//! Contribution chart data.
//!
//! Emits the series a front end needs to draw the per-author additions vs
//! deletions bar chart. Rendering itself is out of scope here; the data is
//! serialized alongside the report.

use devpulse_core::ActivityReport;
use serde::{Deserialize, Serialize};

/// One bar pair in the contribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Author login.
    pub author: String,
    /// Lines added over the window.
    pub additions: u64,
    /// Lines removed over the window.
    pub deletions: u64,
}

/// Per-author contribution chart payload.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use devpulse_core::{ActivityReport, AggregateMetrics, AuthorRollup, HarvestMetrics};
/// use devpulse_narrate::chart::ChartData;
///
/// let report = ActivityReport {
///     totals: AggregateMetrics::default(),
///     authors: vec![AuthorRollup {
///         author: "alice".into(),
///         additions: 120,
///         deletions: 30,
///         files_touched: 4,
///     }],
///     outliers: vec![],
///     harvest: HarvestMetrics::default(),
///     generated_at: Utc::now(),
/// };
/// let chart = ChartData::from_report(&report).unwrap();
/// assert_eq!(chart.series[0].author, "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Chart title.
    pub title: String,
    /// Ranked per-author bars, highest churn first.
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    /// Build chart data from a report.
    ///
    /// Returns `None` when no author has any churn, matching the report's
    /// "No contributions found" case; an all-zero chart is just noise.
    pub fn from_report(report: &ActivityReport) -> Option<Self> {
        if !report.authors.iter().any(|a| a.churn() > 0) {
            return None;
        }
        let series = report
            .authors
            .iter()
            .map(|rollup| ChartSeries {
                author: rollup.author.clone(),
                additions: rollup.additions,
                deletions: rollup.deletions,
            })
            .collect();
        Some(Self {
            title: "Per-author contributions".into(),
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devpulse_core::{AggregateMetrics, AuthorRollup, HarvestMetrics};

    fn report(authors: Vec<AuthorRollup>) -> ActivityReport {
        ActivityReport {
            totals: AggregateMetrics::default(),
            authors,
            outliers: vec![],
            harvest: HarvestMetrics::default(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn series_follows_report_ranking() {
        let report = report(vec![
            AuthorRollup {
                author: "alice".into(),
                additions: 130,
                deletions: 25,
                files_touched: 9,
            },
            AuthorRollup {
                author: "bob".into(),
                additions: 50,
                deletions: 10,
                files_touched: 2,
            },
        ]);
        let chart = ChartData::from_report(&report).unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].author, "alice");
        assert_eq!(chart.series[1].author, "bob");
    }

    #[test]
    fn empty_when_no_churn() {
        assert!(ChartData::from_report(&report(vec![])).is_none());

        let zero = report(vec![AuthorRollup {
            author: "alice".into(),
            additions: 0,
            deletions: 0,
            files_touched: 0,
        }]);
        assert!(ChartData::from_report(&zero).is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let chart = ChartData {
            title: "t".into(),
            series: vec![ChartSeries {
                author: "alice".into(),
                additions: 1,
                deletions: 2,
            }],
        };
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["series"][0]["additions"], 1);
        assert_eq!(json["series"][0]["deletions"], 2);
    }
}
