//! Telegram Bot API `sendMessage`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{MessageChannel, ProviderError, send_json, trim_base};

const PROVIDER: &str = "telegram";

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: Option<String>,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, base_url: &str, bot_token: Option<String>) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            bot_token,
        }
    }
}

#[async_trait]
impl MessageChannel for TelegramClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ProviderError> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let request = self
            .http
            .post(format!("{}/bot{}/sendMessage", self.base_url, token))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "disable_web_page_preview": true,
            }));

        let response: TelegramResponse = send_json(PROVIDER, request).await?;
        if !response.ok {
            return Err(ProviderError::decode(
                PROVIDER,
                response
                    .description
                    .unwrap_or_else(|| "sendMessage returned ok=false".to_string()),
            ));
        }
        Ok(())
    }
}
