//! # Webhook Handlers
//!
//! Vapi server messages and 46elks call callbacks. Verification happens in
//! [`crate::webhook_verification`] before these handlers run.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{Value, json};
use sea_orm::TransactionTrait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::handlers::types::Acknowledgement;
use crate::integrations::elks::{ElksCallAction, ElksHangup, ElksVoiceStart};
use crate::integrations::vapi::{VapiMessage, VapiWebhook};
use crate::models::business::Model as Business;
use crate::models::customer_call::CallRecord;
use crate::notifications::{call_notification_text, fan_out};
use crate::phone::{format_swedish_number, normalize_swedish_number};
use crate::repositories::usage::period_for;
use crate::repositories::{
    BusinessRepository, CallRepository, CustomerRepository, LeadEventRepository,
    PhoneNumberRepository, UsageRepository, lead_event,
};
use crate::server::AppState;
use crate::webhook_verification::elks_callback_url;

/// Vapi server message
///
/// Only `end-of-call-report` is persisted; every other message type is
/// acknowledged and logged.
#[utoipa::path(
    post,
    path = "/api/webhooks/vapi",
    request_body(content = String, content_type = "application/json", description = "Vapi server message envelope"),
    responses(
        (status = 200, description = "Message received", body = Acknowledgement),
        (status = 400, description = "Malformed message", body = ApiError),
        (status = 401, description = "Verification failed", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn vapi_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Acknowledgement>, ApiError> {
    let kind = payload
        .pointer("/message/type")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            validation_error(
                "Malformed Vapi message",
                json!({ "message.type": "required" }),
            )
        })?
        .to_string();

    metrics::counter!("webhook_events_total", "provider" => "vapi", "type" => kind.clone())
        .increment(1);

    if kind != VapiMessage::END_OF_CALL_REPORT {
        debug!(message_type = %kind, "Vapi message acknowledged");
        return Ok(Json(Acknowledgement::received()));
    }

    let webhook: VapiWebhook = serde_json::from_value(payload).map_err(|err| {
        validation_error(
            "Malformed end-of-call report",
            json!({ "message": err.to_string() }),
        )
    })?;
    handle_end_of_call(&state, &webhook.message).await?;

    Ok(Json(Acknowledgement::received()))
}

async fn handle_end_of_call(state: &AppState, message: &VapiMessage) -> Result<(), ApiError> {
    let Some(record) = message.to_call_record() else {
        warn!("End-of-call report without call id");
        return Ok(());
    };
    let Some(assistant_id) = message.assistant_id() else {
        warn!(vapi_call_id = %record.vapi_call_id, "End-of-call report without assistant id");
        return Ok(());
    };

    let Some(business) = BusinessRepository::new(&state.db)
        .find_by_assistant_id(assistant_id)
        .await?
    else {
        warn!(assistant_id, vapi_call_id = %record.vapi_call_id, "End-of-call report for unknown assistant");
        return Ok(());
    };

    match business.production_customer_id() {
        Some(customer_id) => record_customer_call(state, &business, customer_id, &record).await,
        None => record_demo_call(state, &business, &record).await,
    }
}

async fn record_customer_call(
    state: &AppState,
    business: &Business,
    customer_id: Uuid,
    record: &CallRecord,
) -> Result<(), ApiError> {
    let customer = CustomerRepository::new(&state.db).get(customer_id).await?;

    // The call row and its usage increment commit together. A failed usage
    // write rolls the call back, so the redelivered report counts it again.
    let txn = state.db.begin().await?;
    let upserted = CallRepository::new(&txn)
        .upsert_customer_call(customer.id, business.id, record)
        .await?;
    if upserted.inserted {
        let period = period_for(record.started_at.map(|t| t.to_utc()).unwrap_or_else(Utc::now));
        UsageRepository::new(&txn)
            .record_call(
                customer.id,
                &period,
                i64::from(record.duration_seconds),
                record.cost,
            )
            .await?;
    } else {
        info!(vapi_call_id = %record.vapi_call_id, "Redelivered end-of-call report refreshed");
    }
    txn.commit().await?;

    // Channels already marked as sent are skipped, so a redelivery only
    // retries the ones that failed before.
    let call = upserted.model;
    let text = call_notification_text(business, &call);
    let report = fan_out(&customer, &call, &text, &state.notifications).await;
    if report.any()
        && let Err(err) = CallRepository::new(&state.db)
            .mark_notified(call.id, report.whatsapp_sent, report.telegram_sent)
            .await
    {
        warn!(call_id = %call.id, error = %err, "Failed to persist notification flags");
    }

    info!(
        business_id = %business.id,
        call_id = %call.id,
        duration_seconds = record.duration_seconds,
        first_delivery = upserted.inserted,
        whatsapp_sent = report.whatsapp_sent,
        telegram_sent = report.telegram_sent,
        "Customer call recorded"
    );
    Ok(())
}

async fn record_demo_call(
    state: &AppState,
    business: &Business,
    record: &CallRecord,
) -> Result<(), ApiError> {
    let upserted = CallRepository::new(&state.db)
        .upsert_demo_call(business.id, record)
        .await?;
    if !upserted.inserted {
        info!(vapi_call_id = %record.vapi_call_id, "Redelivered demo call report refreshed");
        return Ok(());
    }

    if let Err(err) = LeadEventRepository::new(&state.db)
        .append(
            business.id,
            lead_event::DEMO_CALL_COMPLETED,
            json!({
                "vapi_call_id": record.vapi_call_id,
                "duration_seconds": record.duration_seconds,
                "summary": record.summary,
            }),
        )
        .await
    {
        warn!(business_id = %business.id, error = %err, "Failed to append lead event");
    }

    if state.clients.team_chat.is_configured() {
        let text = format!(
            "Demosamtal med {} ({} s){}",
            business.display_name(),
            record.duration_seconds,
            record
                .summary
                .as_deref()
                .map(|s| format!(": {}", s))
                .unwrap_or_default()
        );
        if let Err(err) = state.clients.team_chat.post(&text).await {
            warn!(business_id = %business.id, error = %err, "Team chat notice failed");
        }
    }

    info!(business_id = %business.id, call_id = %upserted.model.id, "Demo call recorded");
    Ok(())
}

/// 46elks incoming call
///
/// Connects the caller to the assistant's SIP address, or rejects the call
/// when the dialled number is not provisioned.
#[utoipa::path(
    post,
    path = "/api/webhooks/elks/voice",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "46elks call action: `connect` or `hangup`"),
        (status = 401, description = "Verification failed", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn elks_voice(
    State(state): State<AppState>,
    Form(call): Form<ElksVoiceStart>,
) -> Result<Json<ElksCallAction>, ApiError> {
    metrics::counter!("webhook_events_total", "provider" => "46elks", "type" => "voice_start")
        .increment(1);

    let dialled = normalize_swedish_number(&call.to).unwrap_or_else(|| call.to.clone());
    let Some(number) = PhoneNumberRepository::new(&state.db)
        .find_active_by_number(&dialled)
        .await?
    else {
        warn!(callid = %call.callid, to = %call.to, "Incoming call to unknown number rejected");
        return Ok(Json(ElksCallAction::reject()));
    };

    let whenhangup = elks_callback_url(&state.config, "/api/webhooks/elks/hangup")
        .map_err(|err| warn!(error = %err, "Cannot build hangup callback URL"))
        .ok();

    info!(
        callid = %call.callid,
        business_id = %number.business_id,
        to = %format_swedish_number(&number.number),
        "Connecting incoming call"
    );
    Ok(Json(ElksCallAction::Connect {
        connect: number.forwarding_number,
        callerid: None,
        whenhangup,
    }))
}

/// 46elks call ended
#[utoipa::path(
    post,
    path = "/api/webhooks/elks/hangup",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 204, description = "Hangup recorded"),
        (status = 401, description = "Verification failed", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn elks_hangup(
    State(state): State<AppState>,
    Form(hangup): Form<ElksHangup>,
) -> Result<StatusCode, ApiError> {
    metrics::counter!("webhook_events_total", "provider" => "46elks", "type" => "hangup")
        .increment(1);
    info!(
        callid = %hangup.callid,
        duration = hangup.duration.unwrap_or_default(),
        state = hangup.state.as_deref().unwrap_or("unknown"),
        "Call hung up"
    );

    let Some(to) = hangup.to.as_deref() else {
        return Ok(StatusCode::NO_CONTENT);
    };
    let dialled = normalize_swedish_number(to).unwrap_or_else(|| to.to_string());
    if let Some(number) = PhoneNumberRepository::new(&state.db)
        .find_active_by_number(&dialled)
        .await?
    {
        if let Err(err) = LeadEventRepository::new(&state.db)
            .append(
                number.business_id,
                lead_event::CALL_HANGUP,
                json!({
                    "callid": hangup.callid,
                    "from": hangup.from,
                    "duration": hangup.duration,
                    "cost": hangup.cost,
                    "state": hangup.state,
                }),
            )
            .await
        {
            warn!(business_id = %number.business_id, error = %err, "Failed to append hangup event");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
