/// Errors that can occur across the devpulse platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use devpulse_core::PulseError;
///
/// let err = PulseError::Config("missing GitHub repo".into());
/// assert!(err.to_string().contains("missing GitHub repo"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API or network failure while harvesting.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Slack API error while delivering a report.
    #[error("Slack error: {0}")]
    Slack(String),

    /// Report persistence failure.
    #[error("store error: {0}")]
    Store(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PulseError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = PulseError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn github_error_displays_message() {
        let err = PulseError::GitHub("API error 403".into());
        assert_eq!(err.to_string(), "GitHub error: API error 403");
    }
}
