//! Activity analysis: churn aggregation, outlier detection, and ranking.
//!
//! Reduces the harvester's normalized change events into per-author rollups,
//! scalar totals, and statistically anomalous high-churn changes. Every
//! function here is a pure input-to-output transformation; nothing performs
//! I/O or keeps state across runs.

pub mod aggregate;
pub mod outliers;
pub mod ranking;
pub mod rates;
pub mod report;

pub use report::analyze;
