//! # Customer Handlers
//!
//! Endpoints for the signed-in customer: notification settings, voice,
//! call history, usage and phone numbers. Everything is scoped to the
//! customer named by `X-Customer-Id`.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{CustomerExtension, CustomerHeader};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{CallListResponse, PageQuery, UpdateSettingsRequest};
use crate::models::customer::{CustomerSettings, Model as Customer};
use crate::models::customer_call::CustomerCallResponse;
use crate::models::phone_number::PhoneNumberResponse;
use crate::models::usage_record::UsageResponse;
use crate::phone::normalize_swedish_number;
use crate::repositories::{
    BusinessRepository, CallRepository, CustomerRepository, PhoneNumberRepository,
    SettingsUpdate, UsageRepository, VoiceOptionRepository,
};
use crate::server::AppState;

/// Current notification settings
#[utoipa::path(
    get,
    path = "/api/customer/settings",
    security(("bearer_auth" = [])),
    params(CustomerHeader),
    responses(
        (status = 200, description = "Customer settings", body = CustomerSettings),
        (status = 404, description = "Customer not found", body = ApiError)
    ),
    tag = "customer"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
) -> Result<Json<CustomerSettings>, ApiError> {
    let customer = load_customer(&state, customer_id).await?;
    let voice_id = current_voice(&state, customer_id).await?;
    Ok(Json(CustomerSettings::from_model(customer, voice_id)))
}

/// Update notification settings and the assistant voice
#[utoipa::path(
    put,
    path = "/api/customer/settings",
    security(("bearer_auth" = [])),
    params(CustomerHeader),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = CustomerSettings),
        (status = 400, description = "Invalid number, chat id or voice", body = ApiError),
        (status = 404, description = "Customer not found", body = ApiError),
        (status = 502, description = "Voice provider failed", body = ApiError)
    ),
    tag = "customer"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<CustomerSettings>, ApiError> {
    let customer = load_customer(&state, customer_id).await?;

    let whatsapp_number = match request.whatsapp_number {
        Some(Some(raw)) if !raw.trim().is_empty() => {
            Some(Some(normalize_swedish_number(&raw).ok_or_else(|| {
                validation_error(
                    "Invalid WhatsApp number",
                    json!({ "whatsapp_number": "must be a Swedish mobile or landline number" }),
                )
            })?))
        }
        Some(_) => Some(None),
        None => None,
    };
    let telegram_chat_id = match request.telegram_chat_id {
        Some(Some(raw)) if !raw.trim().is_empty() => Some(Some(raw.trim().to_string())),
        Some(_) => Some(None),
        None => None,
    };

    let whatsapp_ready = whatsapp_number
        .clone()
        .unwrap_or(customer.whatsapp_number.clone())
        .is_some();
    if request.whatsapp_enabled == Some(true) && !whatsapp_ready {
        return Err(validation_error(
            "WhatsApp number required",
            json!({ "whatsapp_number": "required when WhatsApp notifications are enabled" }),
        ));
    }
    let telegram_ready = telegram_chat_id
        .clone()
        .unwrap_or(customer.telegram_chat_id.clone())
        .is_some();
    if request.telegram_enabled == Some(true) && !telegram_ready {
        return Err(validation_error(
            "Telegram chat id required",
            json!({ "telegram_chat_id": "required when Telegram notifications are enabled" }),
        ));
    }

    if let Some(voice_id) = request.voice_id.as_deref() {
        apply_voice(&state, customer_id, voice_id).await?;
    }

    let updated = CustomerRepository::new(&state.db)
        .update_settings(
            customer_id,
            SettingsUpdate {
                name: request.name,
                whatsapp_enabled: request.whatsapp_enabled,
                whatsapp_number,
                telegram_enabled: request.telegram_enabled,
                telegram_chat_id,
            },
        )
        .await?;

    let voice_id = current_voice(&state, customer_id).await?;
    Ok(Json(CustomerSettings::from_model(updated, voice_id)))
}

/// Call history, newest first
#[utoipa::path(
    get,
    path = "/api/customer/calls",
    security(("bearer_auth" = [])),
    params(CustomerHeader, PageQuery),
    responses(
        (status = 200, description = "Calls", body = CallListResponse)
    ),
    tag = "customer"
)]
pub async fn list_calls(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
    Query(page): Query<PageQuery>,
) -> Result<Json<CallListResponse>, ApiError> {
    let (calls, total) = CallRepository::new(&state.db)
        .list_for_customer(customer_id, page.limit(), page.offset())
        .await?;

    Ok(Json(CallListResponse {
        items: calls.into_iter().map(CustomerCallResponse::from).collect(),
        total,
        limit: page.limit(),
        offset: page.offset(),
    }))
}

/// One call with its transcript
#[utoipa::path(
    get,
    path = "/api/customer/calls/{id}",
    security(("bearer_auth" = [])),
    params(CustomerHeader, ("id" = Uuid, Path, description = "Call id")),
    responses(
        (status = 200, description = "Call", body = CustomerCallResponse),
        (status = 404, description = "Call not found", body = ApiError)
    ),
    tag = "customer"
)]
pub async fn get_call(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerCallResponse>, ApiError> {
    let call = CallRepository::new(&state.db)
        .find_for_customer(customer_id, id)
        .await?
        .ok_or_else(|| not_found("Call not found"))?;
    Ok(Json(call.into()))
}

/// Monthly usage, newest period first
#[utoipa::path(
    get,
    path = "/api/customer/usage",
    security(("bearer_auth" = [])),
    params(CustomerHeader),
    responses(
        (status = 200, description = "Usage per month", body = [UsageResponse])
    ),
    tag = "customer"
)]
pub async fn usage(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
) -> Result<Json<Vec<UsageResponse>>, ApiError> {
    let records = UsageRepository::new(&state.db)
        .list_for_customer(customer_id)
        .await?;
    Ok(Json(records.into_iter().map(UsageResponse::from).collect()))
}

/// Provisioned phone numbers
#[utoipa::path(
    get,
    path = "/api/customer/phone-numbers",
    security(("bearer_auth" = [])),
    params(CustomerHeader),
    responses(
        (status = 200, description = "Phone numbers", body = [PhoneNumberResponse])
    ),
    tag = "customer"
)]
pub async fn phone_numbers(
    State(state): State<AppState>,
    CustomerExtension(customer_id): CustomerExtension,
) -> Result<Json<Vec<PhoneNumberResponse>>, ApiError> {
    let numbers = PhoneNumberRepository::new(&state.db)
        .list_for_customer(customer_id)
        .await?;
    Ok(Json(numbers.into_iter().map(PhoneNumberResponse::from).collect()))
}

async fn load_customer(state: &AppState, customer_id: Uuid) -> Result<Customer, ApiError> {
    CustomerRepository::new(&state.db)
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| not_found("Customer not found"))
}

/// Voice of the customer's first business with one set.
async fn current_voice(state: &AppState, customer_id: Uuid) -> Result<Option<String>, ApiError> {
    let businesses = BusinessRepository::new(&state.db)
        .list_for_customer(customer_id)
        .await?;
    Ok(businesses.into_iter().find_map(|b| b.voice_id))
}

/// Pushes the voice to every assistant the customer owns, then stores it.
async fn apply_voice(state: &AppState, customer_id: Uuid, voice_id: &str) -> Result<(), ApiError> {
    let voice = VoiceOptionRepository::new(&state.db)
        .find(voice_id)
        .await?
        .ok_or_else(|| {
            validation_error(
                "Unknown voice",
                json!({ "voice_id": format!("'{}' is not an available voice", voice_id) }),
            )
        })?;

    let businesses = BusinessRepository::new(&state.db);
    for business in businesses.list_for_customer(customer_id).await? {
        if business.voice_id.as_deref() == Some(voice.id.as_str()) {
            continue;
        }
        if let Some(assistant_id) = business.vapi_assistant_id.as_deref() {
            state
                .clients
                .vapi
                .update_assistant_voice(assistant_id, &voice.provider, &voice.id)
                .await?;
        }
        businesses.set_voice(business.id, &voice.id).await?;
        tracing::info!(business_id = %business.id, voice_id = %voice.id, "Assistant voice updated");
    }
    Ok(())
}
