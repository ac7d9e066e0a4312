use std::time::Duration;

use devpulse_core::{ActivityReport, LlmConfig, PulseError};
use serde::{Deserialize, Serialize};

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use devpulse_narrate::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Summarize this activity".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// OpenAI-compatible chat completions client for the report narrative.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Together, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use devpulse_core::LlmConfig;
/// use devpulse_narrate::llm::LlmClient;
///
/// let client = LlmClient::new(&LlmConfig::default()).unwrap();
/// assert_eq!(client.model(), "gpt-4o-mini");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, PulseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PulseError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Llm`] on HTTP errors or response parsing failures.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, PulseError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com");
        let url = format!("{base_url}/v1/chat/completions");

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.2,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| PulseError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PulseError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PulseError::Llm(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                PulseError::Llm(format!("unexpected response structure: {response_body}"))
            })?;

        Ok(content.to_string())
    }

    /// Ask the LLM for a short narrative over the report's metrics.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Llm`] on any API failure; callers fall back to
    /// the template narrative.
    pub async fn narrate(&self, report: &ActivityReport) -> Result<String, PulseError> {
        let messages = vec![ChatMessage {
            role: Role::User,
            content: build_narrative_prompt(report)?,
        }];
        self.chat(messages).await
    }
}

/// Build the metrics prompt sent to the LLM.
///
/// # Errors
///
/// Returns [`PulseError::Serialization`] if the report cannot be serialized.
pub fn build_narrative_prompt(report: &ActivityReport) -> Result<String, PulseError> {
    let metrics = serde_json::json!({
        "additions": report.totals.total_additions,
        "deletions": report.totals.total_deletions,
        "ci_failures": report.totals.ci_failures,
        "total_prs": report.harvest.total_prs,
        "merged_prs": report.harvest.merged_prs,
        "throughput_percent": report.harvest.throughput_percent,
        "review_latency_hours": report.harvest.avg_review_latency_hours,
        "cycle_time_hours": report.harvest.avg_cycle_time_hours,
        "mttr_hours": report.harvest.mttr_hours,
        "per_author": report.authors,
        "churn_outliers": report.outliers,
    });

    Ok(format!(
        "Summarize this GitHub engineering activity:\n{}\n\n\
         Focus on DORA metrics and team insight. Use hours for latency and \
         cycle time (not days). Keep the summary concise, under 100 words.",
        serde_json::to_string_pretty(&metrics)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devpulse_core::{AggregateMetrics, AuthorRollup, HarvestMetrics};

    fn report() -> ActivityReport {
        ActivityReport {
            totals: AggregateMetrics {
                total_additions: 100,
                total_deletions: 40,
                ci_failures: 1,
            },
            authors: vec![AuthorRollup {
                author: "alice".into(),
                additions: 100,
                deletions: 40,
                files_touched: 3,
            }],
            outliers: vec![],
            harvest: HarvestMetrics::default(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn client_construction_succeeds() {
        let client = LlmClient::new(&LlmConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn model_returns_config_model() {
        let config = LlmConfig {
            model: "mistralai/Mistral-7B-Instruct-v0.1".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "mistralai/Mistral-7B-Instruct-v0.1");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn prompt_embeds_metrics_and_instructions() {
        let prompt = build_narrative_prompt(&report()).unwrap();
        assert!(prompt.contains("\"additions\": 100"));
        assert!(prompt.contains("alice"));
        assert!(prompt.contains("under 100 words"));
    }
}
