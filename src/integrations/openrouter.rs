//! OpenRouter chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ProviderError, send_json, trim_base};
use crate::pipeline::BusinessExtractor;
use crate::pipeline::prompt::{
    EXTRACTION_SYSTEM_PROMPT, ExtractedBusiness, extraction_prompt, parse_extraction,
};

const PROVIDER: &str = "openrouter";

pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            api_key,
            model: model.to_string(),
        }
    }

    /// Single-turn completion expecting a JSON object reply.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);

        let response: ChatResponse = send_json(PROVIDER, request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::decode(PROVIDER, "completion has no content"))
    }
}

#[async_trait]
impl BusinessExtractor for OpenRouterClient {
    async fn extract(&self, url: &str, markdown: &str) -> Result<ExtractedBusiness, ProviderError> {
        let reply = self
            .complete(EXTRACTION_SYSTEM_PROMPT, &extraction_prompt(url, markdown))
            .await?;
        parse_extraction(&reply).map_err(|err| ProviderError::decode(PROVIDER, err.to_string()))
    }
}
