//! Core types, configuration, and error handling for the devpulse platform.
//!
//! This crate provides the shared foundation used by all other devpulse crates:
//! - [`PulseError`] — unified error type using `thiserror`
//! - [`PulseConfig`] — configuration loaded from `.devpulse.toml`
//! - Shared types: [`ChangeEvent`], [`AuthorRollup`], [`ChurnOutlier`],
//!   [`AggregateMetrics`], [`HarvestMetrics`], [`ActivityReport`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GitHubConfig, LlmConfig, PulseConfig, ReportConfig, SlackConfig, StoreConfig};
pub use error::PulseError;
pub use types::{
    ActivityReport, AggregateMetrics, AuthorRollup, ChangeEvent, ChurnOutlier, HarvestMetrics,
    OutputFormat,
};

/// A convenience `Result` type for devpulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
