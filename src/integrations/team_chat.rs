//! Slack-compatible incoming webhook for internal notices.

use serde_json::json;

use super::{ProviderError, send};

const PROVIDER: &str = "team_chat";

pub struct TeamChatClient {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl TeamChatClient {
    pub fn new(http: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self { http, webhook_url }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn post(&self, text: &str) -> Result<(), ProviderError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        send(PROVIDER, self.http.post(url).json(&json!({ "text": text })))
            .await
            .map(|_| ())
    }
}
