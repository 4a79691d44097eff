//! Resend transactional email client.

use serde::{Deserialize, Serialize};

use super::{ProviderError, send_json, trim_base};

const PROVIDER: &str = "resend";

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    #[serde(flatten)]
    email: &'a OutgoingEmail,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

pub struct ResendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    from: String,
}

impl ResendClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>, from: &str) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            api_key,
            from: from.to_string(),
        }
    }

    /// Sends the email and returns Resend's message id.
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let request = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.from,
                email,
            });

        let response: SendResponse = send_json(PROVIDER, request).await?;
        Ok(response.id)
    }
}
