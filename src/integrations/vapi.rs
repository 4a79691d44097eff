//! Vapi client and server-message payloads.
//!
//! Outbound: assistant creation, voice changes and phone number import.
//! Inbound: the `{"message": {...}}` envelope Vapi posts to the server URL.

use async_trait::async_trait;
use chrono::DateTime;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ProviderError, send, send_json, trim_base};
use crate::models::customer_call::{CallRecord, TranscriptTurn};
use crate::pipeline::AssistantProvisioner;

const PROVIDER: &str = "vapi";

/// SIP host Vapi answers on for imported numbers.
pub const VAPI_SIP_HOST: &str = "sip.vapi.ai";

/// Everything needed to create a hosted assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSpec {
    pub name: String,
    pub first_message: String,
    pub system_prompt: String,
    pub voice_provider: String,
    pub voice_id: String,
    /// Where Vapi posts server messages for this assistant
    pub server_url: String,
    pub server_secret: Option<String>,
    pub language: String,
}

/// Picks the speech provider from the shape of a voice id. Azure neural
/// voices look like `sv-SE-SofieNeural`.
pub fn infer_voice_provider(voice_id: &str) -> &'static str {
    if voice_id.ends_with("Neural") {
        "azure"
    } else {
        "11labs"
    }
}

/// Phone number registered at Vapi.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiPhoneNumber {
    pub id: String,
    #[serde(default)]
    pub sip_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: String,
}

pub struct VapiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VapiClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))
    }

    /// Creates an assistant and returns its id.
    pub async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;

        let mut body = json!({
            "name": truncate_name(&spec.name),
            "firstMessage": spec.first_message,
            "model": {
                "provider": "openai",
                "model": "gpt-4o-mini",
                "temperature": 0.4,
                "messages": [{ "role": "system", "content": spec.system_prompt }],
            },
            "voice": { "provider": spec.voice_provider, "voiceId": spec.voice_id },
            "transcriber": { "provider": "deepgram", "model": "nova-2", "language": spec.language },
            "serverUrl": spec.server_url,
            "serverMessages": ["end-of-call-report", "status-update", "hang"],
            "endCallFunctionEnabled": true,
            "analysisPlan": {
                "structuredDataSchema": {
                    "type": "object",
                    "properties": {
                        "sentiment": { "type": "string", "enum": ["positive", "neutral", "negative"] },
                        "actionItems": { "type": "array", "items": { "type": "string" } },
                    },
                },
            },
        });
        if let Some(secret) = &spec.server_secret {
            body["serverUrlSecret"] = Value::String(secret.clone());
        }

        let request = self
            .http
            .post(format!("{}/assistant", self.base_url))
            .bearer_auth(api_key)
            .json(&body);

        let created: CreatedResource = send_json(PROVIDER, request).await?;
        Ok(created.id)
    }

    pub async fn update_assistant_voice(
        &self,
        assistant_id: &str,
        voice_provider: &str,
        voice_id: &str,
    ) -> Result<(), ProviderError> {
        let api_key = self.api_key()?;

        let request = self
            .http
            .patch(format!("{}/assistant/{}", self.base_url, assistant_id))
            .bearer_auth(api_key)
            .json(&json!({ "voice": { "provider": voice_provider, "voiceId": voice_id } }));

        send(PROVIDER, request).await.map(|_| ())
    }

    /// Registers an externally owned number (46elks) and binds it to the assistant.
    pub async fn import_phone_number(
        &self,
        number: &str,
        assistant_id: &str,
        label: &str,
    ) -> Result<VapiPhoneNumber, ProviderError> {
        let api_key = self.api_key()?;

        let request = self
            .http
            .post(format!("{}/phone-number", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "provider": "byo-phone-number",
                "number": number,
                "numberE164CheckEnabled": false,
                "assistantId": assistant_id,
                "name": truncate_name(label),
            }));

        send_json(PROVIDER, request).await
    }
}

/// Vapi limits assistant and number names to 40 characters.
fn truncate_name(name: &str) -> String {
    name.chars().take(40).collect()
}

#[async_trait]
impl AssistantProvisioner for VapiClient {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ProviderError> {
        VapiClient::create_assistant(self, spec).await
    }
}

/// Body of every Vapi server message.
#[derive(Debug, Clone, Deserialize)]
pub struct VapiWebhook {
    pub message: VapiMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub call: Option<VapiCall>,
    pub assistant: Option<VapiAssistantRef>,
    pub status: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_seconds: Option<f64>,
    pub cost: Option<f64>,
    pub ended_reason: Option<String>,
    pub recording_url: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub messages: Vec<VapiTranscriptMessage>,
    pub analysis: Option<VapiAnalysis>,
    pub artifact: Option<VapiArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiCall {
    pub id: String,
    pub assistant_id: Option<String>,
    pub customer: Option<VapiCustomer>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VapiCustomer {
    pub number: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VapiAssistantRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiTranscriptMessage {
    pub role: String,
    pub message: Option<String>,
    pub content: Option<String>,
    pub seconds_from_start: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiAnalysis {
    pub summary: Option<String>,
    pub structured_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapiArtifact {
    #[serde(default)]
    pub messages: Vec<VapiTranscriptMessage>,
    pub recording_url: Option<String>,
}

impl VapiMessage {
    pub const END_OF_CALL_REPORT: &'static str = "end-of-call-report";

    pub fn is_end_of_call_report(&self) -> bool {
        self.kind == Self::END_OF_CALL_REPORT
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call.as_ref().map(|call| call.id.as_str())
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.call
            .as_ref()
            .and_then(|call| call.assistant_id.as_deref())
            .or_else(|| self.assistant.as_ref().and_then(|a| a.id.as_deref()))
    }

    /// Builds the stored call record. `None` when the report has no call id.
    pub fn to_call_record(&self) -> Option<CallRecord> {
        let call = self.call.as_ref()?;
        if call.id.is_empty() {
            return None;
        }

        let started_at = parse_timestamp(self.started_at.as_deref().or(call.started_at.as_deref()));
        let ended_at = parse_timestamp(self.ended_at.as_deref().or(call.ended_at.as_deref()));

        let duration_seconds = match (self.duration_seconds, started_at, ended_at) {
            (Some(seconds), _, _) => seconds.round().max(0.0) as i32,
            (None, Some(start), Some(end)) => (end - start).num_seconds().max(0) as i32,
            _ => 0,
        };

        let messages = match &self.artifact {
            Some(artifact) if !artifact.messages.is_empty() => &artifact.messages,
            _ => &self.messages,
        };
        let transcript = messages.iter().filter_map(transcript_turn).collect();

        let structured = self
            .analysis
            .as_ref()
            .and_then(|analysis| analysis.structured_data.as_ref());
        let sentiment = structured
            .and_then(|data| data.get("sentiment"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let action_items = structured
            .and_then(|data| data.get("actionItems").or_else(|| data.get("action_items")))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let summary = self
            .analysis
            .as_ref()
            .and_then(|analysis| analysis.summary.clone())
            .or_else(|| self.summary.clone());

        let recording_url = self
            .artifact
            .as_ref()
            .and_then(|artifact| artifact.recording_url.clone())
            .or_else(|| self.recording_url.clone());

        let customer = call.customer.as_ref();

        Some(CallRecord {
            vapi_call_id: call.id.clone(),
            caller_number: customer.and_then(|c| c.number.clone()),
            caller_name: customer.and_then(|c| c.name.clone()),
            started_at,
            ended_at,
            duration_seconds,
            transcript,
            summary,
            sentiment,
            action_items,
            recording_url,
            ended_reason: self.ended_reason.clone(),
            cost: self.cost.unwrap_or_default(),
        })
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTimeWithTimeZone> {
    value.and_then(|v| DateTime::parse_from_rfc3339(v).ok())
}

fn transcript_turn(message: &VapiTranscriptMessage) -> Option<TranscriptTurn> {
    let role = match message.role.as_str() {
        "bot" | "assistant" => "assistant",
        "user" | "customer" => "user",
        _ => return None,
    };
    let content = message
        .message
        .as_deref()
        .or(message.content.as_deref())?
        .trim();
    if content.is_empty() {
        return None;
    }

    Some(TranscriptTurn {
        role: role.to_string(),
        content: content.to_string(),
        timestamp: message.seconds_from_start,
    })
}
