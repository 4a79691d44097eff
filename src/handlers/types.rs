//! # Common API Types
//!
//! Request and response bodies shared across handlers, plus pagination helpers.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::business::BusinessResponse;
use crate::models::customer_call::CustomerCallResponse;
use crate::models::phone_number::PhoneNumberResponse;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

/// `limit`/`offset` query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size (default 50, max 200)
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// Filters for the business list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BusinessQuery {
    /// Pipeline status, e.g. `agent_created`
    pub status: Option<String>,
    /// Matches name, website or slug
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BusinessListResponse {
    pub items: Vec<BusinessResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallListResponse {
    pub items: Vec<CustomerCallResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Public demo page card
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DemoCard {
    pub name: String,
    pub slug: String,
    pub industry: Option<String>,
    pub website_url: String,
    /// Assistant the demo page's web call connects to
    pub assistant_id: String,
    pub services: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PipelineRequest {
    #[schema(example = "https://salonglisa.se")]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchPipelineRequest {
    pub urls: Vec<String>,
}

/// Editable business fields; omitted fields are left untouched
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateBusinessRequest {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub services: Option<Vec<String>>,
    pub opening_hours: Option<serde_json::Value>,
    #[schema(example = "contacted")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SendEmailRequest {
    /// Recipient; defaults to the business email
    pub to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivateRequest {
    pub email: String,
    pub auth_user_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivationResponse {
    pub business: BusinessResponse,
    pub customer_id: Uuid,
    pub phone_number: PhoneNumberResponse,
}

/// Settings update. For the nullable destinations, an explicit `null`
/// clears the value and an absent field keeps it.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub whatsapp_enabled: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub whatsapp_number: Option<Option<String>>,
    pub telegram_enabled: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub telegram_chat_id: Option<Option<String>>,
    pub voice_id: Option<String>,
}

/// Generic webhook acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Acknowledgement {
    pub received: bool,
}

impl Acknowledgement {
    pub fn received() -> Self {
        Self { received: true }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_is_clamped() {
        let query = PageQuery {
            limit: Some(10_000),
            offset: None,
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);
        assert_eq!(PageQuery::default().limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageQuery { limit: Some(0), offset: Some(5) }.limit(), 1);
    }

    #[test]
    fn settings_distinguish_null_from_absent() {
        let cleared: UpdateSettingsRequest =
            serde_json::from_str(r#"{"whatsapp_number": null}"#).unwrap();
        assert_eq!(cleared.whatsapp_number, Some(None));
        assert_eq!(cleared.telegram_chat_id, None);

        let set: UpdateSettingsRequest =
            serde_json::from_str(r#"{"telegram_chat_id": "42"}"#).unwrap();
        assert_eq!(set.telegram_chat_id, Some(Some("42".to_string())));
    }
}
