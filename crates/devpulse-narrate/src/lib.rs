//! Report narration and delivery.
//!
//! Turns an [`ActivityReport`] into the human-facing artifacts: a structured
//! summary (text or markdown), an optional LLM-written narrative with a
//! template fallback, contribution-chart data, a Slack post, and an audit
//! trail of delivered summaries.
//!
//! [`ActivityReport`]: devpulse_core::ActivityReport

pub mod audit;
pub mod chart;
pub mod llm;
pub mod notify;
pub mod render;

pub use render::{render_markdown, render_narrative, render_summary};
