use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Top-level configuration loaded from `.devpulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use devpulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.github.since_days, 7);
/// assert_eq!(config.report.outlier_z_threshold, 2.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// GitHub harvester settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Report and analysis settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// LLM provider settings for the narrative summary.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Slack delivery settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Report persistence settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the file cannot be read, or
    /// [`PulseError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use devpulse_core::PulseConfig;
    /// use std::path::Path;
    ///
    /// let config = PulseConfig::from_file(Path::new(".devpulse.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use devpulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [github]
    /// repo = "rust-lang/rust"
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.github.repo.as_deref(), Some("rust-lang/rust"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// GitHub harvester configuration.
///
/// # Examples
///
/// ```
/// use devpulse_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.max_pages, 5);
/// assert!(config.exclude_bots);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository to report on, `owner/repo` form.
    pub repo: Option<String>,
    /// API token; falls back to the `GITHUB_TOKEN` env var.
    pub token: Option<String>,
    /// Reporting window in days (default: 7).
    #[serde(default = "default_since_days")]
    pub since_days: u64,
    /// Page cap for unbounded list endpoints (default: 5).
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Drop events authored by bot accounts (default: true).
    #[serde(default = "default_exclude_bots")]
    pub exclude_bots: bool,
}

fn default_since_days() -> u64 {
    7
}

fn default_max_pages() -> u32 {
    5
}

fn default_exclude_bots() -> bool {
    true
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            token: None,
            since_days: default_since_days(),
            max_pages: default_max_pages(),
            exclude_bots: default_exclude_bots(),
        }
    }
}

/// Report and analysis configuration.
///
/// # Examples
///
/// ```
/// use devpulse_core::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.outlier_z_threshold, 2.0);
/// assert_eq!(config.ci_failure_alert_threshold, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Z-score above which an event's churn is flagged (default: 2.0).
    #[serde(default = "default_z_threshold")]
    pub outlier_z_threshold: f64,
    /// Add an alert line when CI failures exceed this count (default: 3).
    #[serde(default = "default_ci_alert")]
    pub ci_failure_alert_threshold: u64,
    /// Audit log path for delivered summaries (default: `audit_log.jsonl`).
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

fn default_z_threshold() -> f64 {
    2.0
}

fn default_ci_alert() -> u64 {
    3
}

fn default_audit_log() -> String {
    "audit_log.jsonl".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            outlier_z_threshold: default_z_threshold(),
            ci_failure_alert_threshold: default_ci_alert(),
            audit_log: default_audit_log(),
        }
    }
}

/// LLM provider configuration for the narrative summary.
///
/// # Examples
///
/// ```
/// use devpulse_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (e.g. `"openai"`, `"together"`, `"ollama"`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Slack delivery configuration.
///
/// # Examples
///
/// ```
/// use devpulse_core::SlackConfig;
///
/// let config = SlackConfig::default();
/// assert!(config.channel.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token; falls back to the `SLACK_BOT_TOKEN` env var.
    pub bot_token: Option<String>,
    /// Channel ID to post reports to.
    pub channel: Option<String>,
}

/// Report persistence configuration.
///
/// # Examples
///
/// ```
/// use devpulse_core::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.path, "dev_reports.db");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (default: `dev_reports.db`).
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "dev_reports.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PulseConfig::default();
        assert!(config.github.repo.is_none());
        assert_eq!(config.github.since_days, 7);
        assert_eq!(config.github.max_pages, 5);
        assert!(config.github.exclude_bots);
        assert_eq!(config.report.outlier_z_threshold, 2.0);
        assert_eq!(config.report.ci_failure_alert_threshold, 3);
        assert_eq!(config.report.audit_log, "audit_log.jsonl");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.store.path, "dev_reports.db");
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[github]
repo = "microsoft/vscode"
since_days = 14
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("microsoft/vscode"));
        assert_eq!(config.github.since_days, 14);
        assert_eq!(config.report.outlier_z_threshold, 2.0);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[github]
repo = "octocat/hello-world"
max_pages = 2
exclude_bots = false

[report]
outlier_z_threshold = 2.5
ci_failure_alert_threshold = 5

[llm]
provider = "together"
model = "mistralai/Mistral-7B-Instruct-v0.1"
base_url = "https://api.together.xyz"

[slack]
channel = "C0123456"

[store]
path = "/var/lib/devpulse/reports.db"
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert!(!config.github.exclude_bots);
        assert_eq!(config.github.max_pages, 2);
        assert_eq!(config.report.outlier_z_threshold, 2.5);
        assert_eq!(config.llm.provider, "together");
        assert_eq!(config.slack.channel.as_deref(), Some("C0123456"));
        assert_eq!(config.store.path, "/var/lib/devpulse/reports.db");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PulseConfig::from_toml("").unwrap();
        assert_eq!(config.github.since_days, 7);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = PulseConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
