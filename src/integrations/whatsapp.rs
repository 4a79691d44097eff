//! WhatsApp Cloud API text messages.

use async_trait::async_trait;
use serde_json::json;

use super::{MessageChannel, ProviderError, send, trim_base};

const PROVIDER: &str = "whatsapp";

pub struct WhatsAppClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    phone_number_id: Option<String>,
}

impl WhatsAppClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        access_token: Option<String>,
        phone_number_id: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            access_token,
            phone_number_id,
        }
    }
}

#[async_trait]
impl MessageChannel for WhatsAppClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// `recipient` is an E.164 number; the API wants digits only.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ProviderError> {
        let (Some(token), Some(phone_number_id)) =
            (self.access_token.as_deref(), self.phone_number_id.as_deref())
        else {
            return Err(ProviderError::NotConfigured(PROVIDER));
        };

        let to: String = recipient.chars().filter(char::is_ascii_digit).collect();
        let request = self
            .http
            .post(format!("{}/{}/messages", self.base_url, phone_number_id))
            .bearer_auth(token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "text",
                "text": { "preview_url": false, "body": text },
            }));

        send(PROVIDER, request).await.map(|_| ())
    }
}
