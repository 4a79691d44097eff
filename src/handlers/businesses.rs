//! # Business Administration Handlers
//!
//! Lead listing and edits, the demo email and activation to production.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::OperatorAuth;
use crate::error::{ApiError, conflict, validation_error};
use crate::handlers::types::{
    ActivateRequest, ActivationResponse, BusinessListResponse, BusinessQuery, PageQuery,
    SendEmailRequest, UpdateBusinessRequest,
};
use crate::integrations::resend::OutgoingEmail;
use crate::integrations::vapi::VAPI_SIP_HOST;
use crate::models::business::{BusinessResponse, BusinessStatus, Model as Business};
use crate::models::lead_event::LeadEventResponse;
use crate::phone::normalize_swedish_number;
use crate::repositories::{
    BusinessFilter, BusinessRepository, BusinessUpdate, CustomerRepository, LeadEventRepository,
    NewPhoneNumber, PhoneNumberRepository, lead_event,
};
use crate::server::AppState;
use crate::webhook_verification::elks_callback_url;

/// Country numbers are allocated in.
const NUMBER_COUNTRY: &str = "se";

/// List businesses
#[utoipa::path(
    get,
    path = "/api/businesses",
    security(("bearer_auth" = [])),
    params(BusinessQuery),
    responses(
        (status = 200, description = "Businesses, newest first", body = BusinessListResponse),
        (status = 400, description = "Unknown status filter", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Query(query): Query<BusinessQuery>,
) -> Result<Json<BusinessListResponse>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };

    let filter = BusinessFilter {
        status,
        search: query.search.filter(|s| !s.trim().is_empty()),
        limit: page.limit(),
        offset: page.offset(),
    };
    let (items, total) = BusinessRepository::new(&state.db).list(&filter).await?;

    Ok(Json(BusinessListResponse {
        items: items.into_iter().map(BusinessResponse::from).collect(),
        total,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

/// Get one business
#[utoipa::path(
    get,
    path = "/api/businesses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 200, description = "Business", body = BusinessResponse),
        (status = 404, description = "Business not found", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn get_business(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessResponse>, ApiError> {
    let business = BusinessRepository::new(&state.db).get(id).await?;
    Ok(Json(business.into()))
}

/// Edit business fields or move its status
#[utoipa::path(
    patch,
    path = "/api/businesses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    request_body = UpdateBusinessRequest,
    responses(
        (status = 200, description = "Updated business", body = BusinessResponse),
        (status = 400, description = "Invalid status", body = ApiError),
        (status = 404, description = "Business not found", body = ApiError),
        (status = 409, description = "Status not reachable for this business", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn update_business(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBusinessRequest>,
) -> Result<Json<BusinessResponse>, ApiError> {
    let businesses = BusinessRepository::new(&state.db);
    let current = businesses.get(id).await?;

    let status = request.status.as_deref().map(parse_status).transpose()?;
    if let Some(next) = status {
        check_status_change(&current, next)?;
    }

    let updated = businesses
        .update(
            id,
            BusinessUpdate {
                name: request.name,
                industry: request.industry,
                description: request.description,
                address: request.address,
                phone: request.phone,
                email: request.email,
                services: request.services,
                opening_hours: request.opening_hours,
                status,
            },
        )
        .await?;

    if let Some(next) = status.filter(|next| *next != current.status) {
        append_event(
            &state,
            id,
            lead_event::STATUS_CHANGED,
            json!({ "from": current.status, "to": next }),
        )
        .await;
    }

    Ok(Json(updated.into()))
}

/// Delete a lead
#[utoipa::path(
    delete,
    path = "/api/businesses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Business not found", body = ApiError),
        (status = 409, description = "Production customers cannot be deleted", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn delete_business(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let businesses = BusinessRepository::new(&state.db);
    let business = businesses.get(id).await?;

    if business.customer_id.is_some() || business.status == BusinessStatus::Customer {
        return Err(conflict("Production businesses cannot be deleted"));
    }

    businesses.delete(id).await?;
    tracing::info!(business_id = %id, "Business deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Lead events for a business, newest first
#[utoipa::path(
    get,
    path = "/api/businesses/{id}/events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 200, description = "Lead events", body = [LeadEventResponse]),
        (status = 404, description = "Business not found", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn list_events(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeadEventResponse>>, ApiError> {
    BusinessRepository::new(&state.db).get(id).await?;
    let events = LeadEventRepository::new(&state.db)
        .list_for_business(id)
        .await?;
    Ok(Json(events.into_iter().map(LeadEventResponse::from).collect()))
}

/// Email the business a link to its demo
#[utoipa::path(
    post,
    path = "/api/businesses/{id}/send-email",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Email sent", body = BusinessResponse),
        (status = 400, description = "No recipient", body = ApiError),
        (status = 404, description = "Business not found", body = ApiError),
        (status = 409, description = "Demo not ready or already a customer", body = ApiError),
        (status = 502, description = "Email provider failed", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn send_demo_email(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<BusinessResponse>, ApiError> {
    let businesses = BusinessRepository::new(&state.db);
    let business = businesses.get(id).await?;

    if !business.is_demo_ready() {
        return Err(conflict("Business has no assistant or demo slug yet"));
    }
    if business.is_production() {
        return Err(conflict("Business is already a customer"));
    }

    let recipient = request
        .to
        .or_else(|| business.email.clone())
        .map(|to| to.trim().to_string())
        .filter(|to| is_plausible_email(to))
        .ok_or_else(|| {
            validation_error(
                "No valid recipient",
                json!({ "to": "provide an email address or set one on the business" }),
            )
        })?;

    let demo_url = format!(
        "{}/demo/{}",
        state.config.public_base(),
        business.slug.as_deref().unwrap_or_default()
    );
    let email = demo_email(&business, &recipient, &demo_url);
    let message_id = state.clients.resend.send_email(&email).await?;

    let updated = businesses.mark_email_sent(id).await?;
    append_event(
        &state,
        id,
        lead_event::EMAIL_SENT,
        json!({ "to": recipient, "message_id": message_id, "demo_url": demo_url }),
    )
    .await;
    tracing::info!(business_id = %id, "Demo email sent");

    Ok(Json(updated.into()))
}

/// Move a business to production
///
/// Creates or links the customer, provisions a phone number at 46elks,
/// binds it to the assistant at Vapi and marks the business a customer.
#[utoipa::path(
    post,
    path = "/api/businesses/{id}/activate",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Business id")),
    request_body = ActivateRequest,
    responses(
        (status = 200, description = "Business activated", body = ActivationResponse),
        (status = 400, description = "Invalid email", body = ApiError),
        (status = 404, description = "Business not found", body = ApiError),
        (status = 409, description = "Demo not ready or already active", body = ApiError),
        (status = 502, description = "Telephony provider failed", body = ApiError)
    ),
    tag = "businesses"
)]
pub async fn activate_business(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let businesses = BusinessRepository::new(&state.db);
    let business = businesses.get(id).await?;

    if !business.is_demo_ready() {
        return Err(conflict("Business has no assistant or demo slug yet"));
    }
    if business.customer_id.is_some() || business.status == BusinessStatus::Customer {
        return Err(conflict("Business is already active"));
    }
    let email = request.email.trim();
    if !is_plausible_email(email) {
        return Err(validation_error(
            "Invalid email",
            json!({ "email": "must be a valid email address" }),
        ));
    }
    let assistant_id = business.vapi_assistant_id.clone().unwrap_or_default();

    let customer = CustomerRepository::new(&state.db)
        .find_or_create(
            email,
            request.auth_user_id.as_deref(),
            request.name.as_deref(),
        )
        .await?;

    let allocated = state.clients.elks.allocate_number(NUMBER_COUNTRY).await?;
    let number = normalize_swedish_number(&allocated.number).unwrap_or(allocated.number.clone());
    tracing::info!(business_id = %id, elks_number_id = %allocated.id, "Allocated phone number");

    let vapi_number = state
        .clients
        .vapi
        .import_phone_number(&number, &assistant_id, business.display_name())
        .await?;
    let forwarding_number = vapi_number
        .sip_uri
        .clone()
        .unwrap_or_else(|| format!("sip:{}@{}", number, VAPI_SIP_HOST));

    let voice_start = elks_callback_url(&state.config, "/api/webhooks/elks/voice")
        .map_err(|err| anyhow::anyhow!("invalid public base URL: {}", err))?;
    state
        .clients
        .elks
        .configure_number(&allocated.id, &voice_start)
        .await?;

    let phone_number = PhoneNumberRepository::new(&state.db)
        .create(NewPhoneNumber {
            business_id: id,
            customer_id: customer.id,
            number,
            elks_number_id: allocated.id,
            vapi_phone_number_id: Some(vapi_number.id),
            forwarding_number,
        })
        .await?;

    let activated = businesses.activate(id, customer.id).await?;
    append_event(
        &state,
        id,
        lead_event::ACTIVATED,
        json!({
            "customer_id": customer.id,
            "phone_number": phone_number.number,
        }),
    )
    .await;
    tracing::info!(business_id = %id, customer_id = %customer.id, "Business activated");

    Ok(Json(ActivationResponse {
        business: activated.into(),
        customer_id: customer.id,
        phone_number: phone_number.into(),
    }))
}

fn parse_status(value: &str) -> Result<BusinessStatus, ApiError> {
    BusinessStatus::parse(value.trim()).ok_or_else(|| {
        validation_error(
            "Invalid status",
            json!({ "status": format!("unknown status '{}'", value) }),
        )
    })
}

/// Statuses past `scraped` need an assistant and slug, except `declined`,
/// which any lead can reach. `customer` is only reachable through activation.
fn check_status_change(business: &Business, next: BusinessStatus) -> Result<(), ApiError> {
    if next == BusinessStatus::Customer && business.customer_id.is_none() {
        return Err(conflict("Use the activate endpoint to make a business a customer"));
    }
    if next.has_agent() && next != BusinessStatus::Declined && !business.is_demo_ready() {
        return Err(conflict(&format!(
            "Status '{}' requires an assistant and demo slug",
            next.as_str()
        )));
    }
    Ok(())
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn demo_email(business: &Business, to: &str, demo_url: &str) -> OutgoingEmail {
    let name = business.display_name();
    let subject = format!("{}: lyssna på er nya AI-receptionist", name);
    let text = format!(
        "Hej!\n\nVi har byggt en AI-receptionist åt {name} utifrån er hemsida. \
Den svarar i telefon dygnet runt, svarar på frågor om era tjänster och tar meddelanden.\n\n\
Prova den här: {demo_url}\n\nHör av er om ni vill koppla den till ett eget nummer.\n\n\
Vänliga hälsningar,\nAnythingVoice"
    );
    let html = format!(
        "<p>Hej!</p>\
<p>Vi har byggt en AI-receptionist åt <strong>{name}</strong> utifrån er hemsida. \
Den svarar i telefon dygnet runt, svarar på frågor om era tjänster och tar meddelanden.</p>\
<p><a href=\"{demo_url}\">Prova er demo</a></p>\
<p>Hör av er om ni vill koppla den till ett eget nummer.</p>\
<p>Vänliga hälsningar,<br>AnythingVoice</p>",
        name = html_escape(name),
        demo_url = html_escape(demo_url),
    );

    OutgoingEmail {
        to: vec![to.to_string()],
        subject,
        html,
        text: Some(text),
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn append_event(state: &AppState, business_id: Uuid, event_type: &str, metadata: serde_json::Value) {
    if let Err(err) = LeadEventRepository::new(&state.db)
        .append(business_id, event_type, metadata)
        .await
    {
        tracing::warn!(%business_id, event_type, error = %err, "Failed to append lead event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("info@salonglisa.se"));
        assert!(!is_plausible_email("info@localhost"));
        assert!(!is_plausible_email("@salonglisa.se"));
        assert!(!is_plausible_email("in fo@salonglisa.se"));
        assert!(!is_plausible_email("salonglisa.se"));
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert_eq!(parse_status("email_sent").unwrap(), BusinessStatus::EmailSent);
        assert_eq!(parse_status("archived").unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn html_is_escaped_in_demo_email() {
        assert_eq!(html_escape("<b>Bröd & Co</b>"), "&lt;b&gt;Bröd &amp; Co&lt;/b&gt;");
    }
}
