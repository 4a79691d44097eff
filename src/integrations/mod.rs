//! Outbound provider clients
//!
//! Every client owns a shared `reqwest::Client`, takes its base URL from
//! configuration (so tests can point it at a mock server) and reports
//! failures as [`ProviderError`]. A client built without credentials answers
//! every call with [`ProviderError::NotConfigured`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::truncate_chars;

pub mod elks;
pub mod firecrawl;
pub mod openrouter;
pub mod resend;
pub mod team_chat;
pub mod telegram;
pub mod vapi;
pub mod whatsapp;

pub use elks::ElksClient;
pub use firecrawl::FirecrawlClient;
pub use openrouter::OpenRouterClient;
pub use resend::ResendClient;
pub use team_chat::TeamChatClient;
pub use telegram::TelegramClient;
pub use vapi::VapiClient;
pub use whatsapp::WhatsAppClient;

/// Upstream bodies kept in errors are cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Failure talking to an external provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Http { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Decode { provider, .. } => provider,
            Self::NotConfigured(provider) => provider,
        }
    }

    pub(crate) fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        // reqwest hides the io cause behind its Display; keep it so retry
        // classification can see "timed out" or "connection reset".
        let mut message = err.to_string();
        if err.is_timeout() {
            message.push_str(": request timed out");
        }
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport { provider, message }
    }

    pub(crate) fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }
}

/// Plain-text delivery channel used for customer notifications.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Short channel name for logs and metrics
    fn name(&self) -> &'static str;

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ProviderError>;
}

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("anythingvoice/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

pub(crate) fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Sends the request and returns the response when the status is 2xx.
pub(crate) async fn send(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|err| ProviderError::transport(provider, err))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Http {
        provider,
        status: status.as_u16(),
        body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
    })
}

/// Sends the request and decodes a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = send(provider, request).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ProviderError::transport(provider, err))?;
    serde_json::from_slice(&bytes).map_err(|err| ProviderError::decode(provider, err.to_string()))
}

/// All outbound clients, built once from configuration.
#[derive(Clone)]
pub struct Clients {
    pub firecrawl: Arc<FirecrawlClient>,
    pub openrouter: Arc<OpenRouterClient>,
    pub vapi: Arc<VapiClient>,
    pub elks: Arc<ElksClient>,
    pub resend: Arc<ResendClient>,
    pub whatsapp: Arc<WhatsAppClient>,
    pub telegram: Arc<TelegramClient>,
    pub team_chat: Arc<TeamChatClient>,
}

impl Clients {
    pub fn from_config(config: &AppConfig) -> Self {
        let http = build_http_client(Duration::from_secs(config.http_timeout_secs));

        Self {
            firecrawl: Arc::new(FirecrawlClient::new(
                http.clone(),
                &config.firecrawl_api_base,
                config.firecrawl_api_key.clone(),
            )),
            openrouter: Arc::new(OpenRouterClient::new(
                http.clone(),
                &config.openrouter_api_base,
                config.openrouter_api_key.clone(),
                &config.openrouter_model,
            )),
            vapi: Arc::new(VapiClient::new(
                http.clone(),
                &config.vapi_api_base,
                config.vapi_api_key.clone(),
            )),
            elks: Arc::new(ElksClient::new(
                http.clone(),
                &config.elks_api_base,
                config.elks_api_user.clone(),
                config.elks_api_password.clone(),
            )),
            resend: Arc::new(ResendClient::new(
                http.clone(),
                &config.resend_api_base,
                config.resend_api_key.clone(),
                &config.email_from,
            )),
            whatsapp: Arc::new(WhatsAppClient::new(
                http.clone(),
                &config.whatsapp_api_base,
                config.whatsapp_access_token.clone(),
                config.whatsapp_phone_number_id.clone(),
            )),
            telegram: Arc::new(TelegramClient::new(
                http.clone(),
                &config.telegram_api_base,
                config.telegram_bot_token.clone(),
            )),
            team_chat: Arc::new(TeamChatClient::new(http, config.team_chat_webhook_url.clone())),
        }
    }
}
