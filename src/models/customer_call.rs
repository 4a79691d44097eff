//! CustomerCall entity model
//!
//! Completed inbound call for a production customer. One row per provider
//! call id.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_calls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub customer_id: Uuid,
    pub business_id: Uuid,

    #[sea_orm(unique)]
    pub vapi_call_id: String,

    pub caller_number: Option<String>,
    pub caller_name: Option<String>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub ended_at: Option<DateTimeWithTimeZone>,
    pub duration_seconds: i32,

    /// Ordered `TranscriptTurn` list
    #[sea_orm(column_type = "JsonBinary")]
    pub transcript: Json,

    pub summary: Option<String>,
    pub sentiment: Option<String>,

    /// JSON array of strings
    #[sea_orm(column_type = "JsonBinary")]
    pub action_items: Json,

    pub recording_url: Option<String>,
    pub ended_reason: Option<String>,
    pub cost: f64,
    pub whatsapp_sent: bool,
    pub telegram_sent: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,

    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id"
    )]
    Business,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One turn of a call transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptTurn {
    /// `assistant` or `user`
    pub role: String,
    pub content: String,
    /// Seconds since call start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerCallResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub vapi_call_id: String,
    pub caller_number: Option<String>,
    pub caller_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub started_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>)]
    pub ended_at: Option<DateTimeWithTimeZone>,
    pub duration_seconds: i32,
    pub transcript: Vec<TranscriptTurn>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub action_items: Vec<String>,
    pub recording_url: Option<String>,
    pub ended_reason: Option<String>,
    pub cost: f64,
    pub whatsapp_sent: bool,
    pub telegram_sent: bool,
    #[schema(value_type = String, example = "2025-06-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for CustomerCallResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            business_id: model.business_id,
            vapi_call_id: model.vapi_call_id,
            caller_number: model.caller_number,
            caller_name: model.caller_name,
            started_at: model.started_at,
            ended_at: model.ended_at,
            duration_seconds: model.duration_seconds,
            transcript: serde_json::from_value(model.transcript).unwrap_or_default(),
            summary: model.summary,
            sentiment: model.sentiment,
            action_items: serde_json::from_value(model.action_items).unwrap_or_default(),
            recording_url: model.recording_url,
            ended_reason: model.ended_reason,
            cost: model.cost,
            whatsapp_sent: model.whatsapp_sent,
            telegram_sent: model.telegram_sent,
            created_at: model.created_at,
        }
    }
}

/// Provider-neutral view of a finished call, as parsed from the end-of-call
/// report. Written to either `customer_calls` or `demo_calls`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRecord {
    pub vapi_call_id: String,
    pub caller_number: Option<String>,
    pub caller_name: Option<String>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub ended_at: Option<DateTimeWithTimeZone>,
    pub duration_seconds: i32,
    pub transcript: Vec<TranscriptTurn>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub action_items: Vec<String>,
    pub recording_url: Option<String>,
    pub ended_reason: Option<String>,
    pub cost: f64,
}
