//! Structured report rendering.
//!
//! The summary mirrors what lands in the chat channel: scalar totals, the
//! DORA block, ranked per-author contribution lines, and advisory lines for
//! quiet weeks, CI trouble, and churn outliers.

use std::fmt::Write;

use devpulse_core::{ActivityReport, ReportConfig};
use devpulse_metrics::rates::ratio;

/// Render the structured plain-text summary of a report.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use devpulse_core::{ActivityReport, AggregateMetrics, HarvestMetrics, ReportConfig};
/// use devpulse_narrate::render_summary;
///
/// let report = ActivityReport {
///     totals: AggregateMetrics::default(),
///     authors: vec![],
///     outliers: vec![],
///     harvest: HarvestMetrics::default(),
///     generated_at: Utc::now(),
/// };
/// let summary = render_summary(&report, &ReportConfig::default());
/// assert!(summary.contains("Weekly Dev Report"));
/// assert!(summary.contains("No pull requests opened this week."));
/// ```
pub fn render_summary(report: &ActivityReport, config: &ReportConfig) -> String {
    let mut out = String::new();
    let harvest = &report.harvest;

    let _ = writeln!(out, "Weekly Dev Report");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out, "Total additions:     {}", report.totals.total_additions);
    let _ = writeln!(out, "Total deletions:     {}", report.totals.total_deletions);
    let _ = writeln!(out, "PR throughput:       {}%", harvest.throughput_percent);
    let _ = writeln!(out, "Total PRs:           {}", harvest.total_prs);
    let _ = writeln!(out, "Merged PRs:          {}", harvest.merged_prs);
    let _ = writeln!(
        out,
        "Avg review latency:  {} hrs",
        harvest.avg_review_latency_hours
    );
    let _ = writeln!(
        out,
        "Avg cycle time:      {} hrs",
        harvest.avg_cycle_time_hours
    );
    let _ = writeln!(out, "CI failures:         {}", report.totals.ci_failures);

    let _ = writeln!(out, "\nPer-author contributions:");
    if report.authors.iter().any(|a| a.churn() > 0) {
        for rollup in &report.authors {
            let files = if rollup.files_touched > 0 {
                format!(" ({} files)", rollup.files_touched)
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "  {}: +{} / -{}{files}",
                rollup.author, rollup.additions, rollup.deletions
            );
        }
    } else {
        let _ = writeln!(out, "  No contributions found.");
    }

    let _ = writeln!(out, "\nDORA metrics:");
    let _ = writeln!(
        out,
        "  Lead time for changes:  {} hrs",
        harvest.avg_cycle_time_hours
    );
    let _ = writeln!(
        out,
        "  Deployment frequency:   {} PRs/week",
        harvest.merged_prs
    );
    let _ = writeln!(
        out,
        "  Change failure rate:    {}%",
        ratio(report.totals.ci_failures, harvest.total_prs)
    );
    let mttr = match harvest.mttr_hours {
        Some(hours) => format!("{hours} hrs"),
        None => "N/A".into(),
    };
    let _ = writeln!(out, "  Mean time to recovery:  {mttr}");

    if harvest.total_prs == 0 {
        let _ = writeln!(out, "\nNo pull requests opened this week.");
    }
    if report.totals.ci_failures > config.ci_failure_alert_threshold {
        let _ = writeln!(out, "\nHigh number of CI failures detected.");
    }
    if !report.outliers.is_empty() {
        let _ = writeln!(out, "\nChurn outliers:");
        for o in &report.outliers {
            let files = o
                .files_changed
                .map(|f| format!(" ({f} files)"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} by {}: +{} / -{}{files}, z={}",
                o.id, o.author, o.additions, o.deletions, o.z_score
            );
        }
    }

    out
}

/// Render the report as markdown for chat delivery.
pub fn render_markdown(report: &ActivityReport, config: &ReportConfig) -> String {
    let mut out = String::new();
    let harvest = &report.harvest;

    out.push_str("# Weekly Dev Report\n\n");
    out.push_str(&format!(
        "- **Total additions:** {}\n- **Total deletions:** {}\n",
        report.totals.total_additions, report.totals.total_deletions
    ));
    out.push_str(&format!(
        "- **PR throughput:** {}% ({} merged of {})\n",
        harvest.throughput_percent, harvest.merged_prs, harvest.total_prs
    ));
    out.push_str(&format!(
        "- **Avg review latency:** {} hrs\n- **Avg cycle time:** {} hrs\n",
        harvest.avg_review_latency_hours, harvest.avg_cycle_time_hours
    ));
    out.push_str(&format!(
        "- **CI failures:** {}\n",
        report.totals.ci_failures
    ));

    out.push_str("\n## Contributions\n\n");
    if report.authors.iter().any(|a| a.churn() > 0) {
        out.push_str("| Author | Additions | Deletions | Files |\n");
        out.push_str("|--------|-----------|-----------|-------|\n");
        for rollup in &report.authors {
            out.push_str(&format!(
                "| {} | +{} | -{} | {} |\n",
                rollup.author, rollup.additions, rollup.deletions, rollup.files_touched
            ));
        }
    } else {
        out.push_str("No contributions found.\n");
    }

    out.push_str("\n## DORA Metrics\n\n");
    out.push_str(&format!(
        "- **Lead time for changes:** {} hrs\n- **Deployment frequency:** {} PRs/week\n",
        harvest.avg_cycle_time_hours, harvest.merged_prs
    ));
    out.push_str(&format!(
        "- **Change failure rate:** {}%\n",
        ratio(report.totals.ci_failures, harvest.total_prs)
    ));
    match harvest.mttr_hours {
        Some(hours) => out.push_str(&format!("- **Mean time to recovery:** {hours} hrs\n")),
        None => out.push_str("- **Mean time to recovery:** N/A\n"),
    }

    if harvest.total_prs == 0 {
        out.push_str("\n> No pull requests opened this week.\n");
    }
    if report.totals.ci_failures > config.ci_failure_alert_threshold {
        out.push_str("\n> High number of CI failures detected.\n");
    }
    if !report.outliers.is_empty() {
        out.push_str("\n## Churn Outliers\n\n");
        for o in &report.outliers {
            out.push_str(&format!(
                "- **{}** by {}: +{} / -{} (z = {})\n",
                o.id, o.author, o.additions, o.deletions, o.z_score
            ));
        }
    }

    out
}

/// Template narrative used when the LLM is disabled or fails.
pub fn render_narrative(report: &ActivityReport) -> String {
    let harvest = &report.harvest;
    let mut out = String::new();

    let _ = writeln!(out, "This week in development:");
    let _ = writeln!(
        out,
        "- Review latency averaged {} hours; cycle time held at {} hours.",
        harvest.avg_review_latency_hours, harvest.avg_cycle_time_hours
    );
    let _ = writeln!(
        out,
        "- {}% of PRs were merged ({} of {}), with {} CI failures.",
        harvest.throughput_percent, harvest.merged_prs, harvest.total_prs,
        report.totals.ci_failures
    );

    if let Some(top) = report.authors.iter().find(|a| a.churn() > 0) {
        let files = if top.files_touched > 0 {
            format!(" across {} file(s)", top.files_touched)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "- Top contributor: {} with +{} / -{}{files}.",
            top.author, top.additions, top.deletions
        );
    }

    if !report.outliers.is_empty() {
        let names: Vec<&str> = report.outliers.iter().map(|o| o.author.as_str()).collect();
        let _ = writeln!(
            out,
            "- High churn activity detected from: {}.",
            names.join(", ")
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devpulse_core::{AggregateMetrics, AuthorRollup, ChurnOutlier, HarvestMetrics};

    fn sample_report() -> ActivityReport {
        ActivityReport {
            totals: AggregateMetrics {
                total_additions: 180,
                total_deletions: 35,
                ci_failures: 2,
            },
            authors: vec![
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
                    files_touched: 0,
                },
            ],
            outliers: vec![ChurnOutlier {
                id: "PR #7".into(),
                author: "alice".into(),
                additions: 9000,
                deletions: 100,
                files_changed: Some(44),
                lines_changed: 9100,
                z_score: 2.87,
            }],
            harvest: HarvestMetrics {
                total_prs: 10,
                merged_prs: 8,
                throughput_percent: 80.0,
                avg_review_latency_hours: 3.5,
                avg_cycle_time_hours: 26.0,
                avg_cycle_time_days: 1.08,
                ci_failures: Some(2),
                mttr_hours: None,
            },
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_lists_authors_in_rank_order() {
        let summary = render_summary(&sample_report(), &ReportConfig::default());
        let alice = summary.find("alice: +130 / -25 (9 files)").unwrap();
        let bob = summary.find("bob: +50 / -10").unwrap();
        assert!(alice < bob);
    }

    #[test]
    fn summary_includes_dora_block() {
        let summary = render_summary(&sample_report(), &ReportConfig::default());
        assert!(summary.contains("Lead time for changes:  26 hrs"));
        assert!(summary.contains("Deployment frequency:   8 PRs/week"));
        assert!(summary.contains("Change failure rate:    20%"));
        assert!(summary.contains("Mean time to recovery:  N/A"));
    }

    #[test]
    fn summary_flags_outliers() {
        let summary = render_summary(&sample_report(), &ReportConfig::default());
        assert!(summary.contains("Churn outliers:"));
        assert!(summary.contains("PR #7 by alice: +9000 / -100 (44 files), z=2.87"));
    }

    #[test]
    fn summary_warns_on_quiet_week() {
        let mut report = sample_report();
        report.harvest.total_prs = 0;
        let summary = render_summary(&report, &ReportConfig::default());
        assert!(summary.contains("No pull requests opened this week."));
    }

    #[test]
    fn summary_alerts_on_excessive_ci_failures() {
        let mut report = sample_report();
        report.totals.ci_failures = 5;
        let summary = render_summary(&report, &ReportConfig::default());
        assert!(summary.contains("High number of CI failures detected."));

        // At the threshold, no alert.
        report.totals.ci_failures = 3;
        let summary = render_summary(&report, &ReportConfig::default());
        assert!(!summary.contains("High number of CI failures detected."));
    }

    #[test]
    fn markdown_has_contribution_table() {
        let md = render_markdown(&sample_report(), &ReportConfig::default());
        assert!(md.contains("# Weekly Dev Report"));
        assert!(md.contains("| alice | +130 | -25 | 9 |"));
        assert!(md.contains("## Churn Outliers"));
    }

    #[test]
    fn narrative_names_top_contributor_and_outliers() {
        let narrative = render_narrative(&sample_report());
        assert!(narrative.contains("Top contributor: alice"));
        assert!(narrative.contains("High churn activity detected from: alice."));
    }

    #[test]
    fn narrative_skips_top_contributor_when_idle() {
        let mut report = sample_report();
        report.authors.clear();
        report.outliers.clear();
        let narrative = render_narrative(&report);
        assert!(!narrative.contains("Top contributor"));
        assert!(!narrative.contains("High churn"));
    }
}
