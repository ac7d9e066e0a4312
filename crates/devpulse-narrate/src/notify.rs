//! Slack delivery via `chat.postMessage`.

use std::time::Duration;

use devpulse_core::{PulseError, SlackConfig};

/// Slack client for posting the weekly summary to a channel.
#[derive(Debug)]
pub struct SlackNotifier {
    client: reqwest::Client,
    bot_token: String,
    channel: String,
}

impl SlackNotifier {
    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Slack`] when the bot token or channel is
    /// missing, or if the HTTP client cannot be built.
    pub fn new(config: &SlackConfig) -> Result<Self, PulseError> {
        let bot_token = config
            .bot_token
            .clone()
            .or_else(|| std::env::var("SLACK_BOT_TOKEN").ok())
            .ok_or_else(|| {
                PulseError::Slack(
                    "no bot token configured; set slack.bot_token or SLACK_BOT_TOKEN".into(),
                )
            })?;
        let channel = config
            .channel
            .clone()
            .ok_or_else(|| PulseError::Slack("no channel configured; set slack.channel".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PulseError::Slack(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            bot_token,
            channel,
        })
    }

    /// Post a message to the configured channel.
    ///
    /// Slack reports API failures inside a 200 response, so both the HTTP
    /// status and the `ok` field are checked.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Slack`] on transport failures or when the API
    /// answers with `ok: false`.
    pub async fn post(&self, text: &str) -> Result<(), PulseError> {
        let body = serde_json::json!({
            "channel": self.channel,
            "text": text,
        });

        let response = self
            .client
            .post("https://slack.com/api/chat.postMessage")
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PulseError::Slack(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PulseError::Slack(format!(
                "Slack API error {status}: {body_text}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PulseError::Slack(format!("failed to parse response: {e}")))?;
        if payload.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = payload
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(PulseError::Slack(format!("Slack rejected message: {error}")));
        }

        Ok(())
    }
}
