//! GitHub activity harvesting.
//!
//! Pulls recent pull-request, review, CI, and incident activity from the
//! GitHub REST API and normalizes it into the flat [`ChangeEvent`] sequence
//! plus precomputed window metrics that the analysis core consumes.
//!
//! [`ChangeEvent`]: devpulse_core::ChangeEvent

pub mod client;
pub mod events;
pub mod metrics;
pub mod records;

pub use client::{parse_repo_reference, GitHubClient};
pub use events::harvest;
