//! # Business Model
//!
//! A business enters the system when its website URL is first submitted to the
//! pipeline and moves through the lead statuses until it either becomes a
//! production customer or declines.

use sea_orm::{ActiveModelBehavior, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: Option<String>,

    /// URL-safe identifier used for the public demo page
    #[sea_orm(unique)]
    pub slug: Option<String>,

    pub website_url: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// JSON array of service names
    #[sea_orm(column_type = "JsonBinary")]
    pub services: Option<Json>,

    /// Free-form opening hours, usually an object keyed by weekday
    #[sea_orm(column_type = "JsonBinary")]
    pub opening_hours: Option<Json>,

    /// Raw markdown returned by the scraper
    pub scraped_markdown: Option<String>,

    pub status: BusinessStatus,

    pub vapi_assistant_id: Option<String>,
    pub voice_id: Option<String>,
    pub customer_id: Option<Uuid>,

    /// Last pipeline failure, cleared when a later run succeeds
    pub error_message: Option<String>,

    pub email_sent_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "scraped")]
    Scraped,

    #[sea_orm(string_value = "agent_created")]
    AgentCreated,

    #[sea_orm(string_value = "email_sent")]
    EmailSent,

    #[sea_orm(string_value = "interested")]
    Interested,

    #[sea_orm(string_value = "contacted")]
    Contacted,

    #[sea_orm(string_value = "customer")]
    Customer,

    #[sea_orm(string_value = "declined")]
    Declined,
}

impl BusinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStatus::Pending => "pending",
            BusinessStatus::Scraped => "scraped",
            BusinessStatus::AgentCreated => "agent_created",
            BusinessStatus::EmailSent => "email_sent",
            BusinessStatus::Interested => "interested",
            BusinessStatus::Contacted => "contacted",
            BusinessStatus::Customer => "customer",
            BusinessStatus::Declined => "declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BusinessStatus::Pending),
            "scraped" => Some(BusinessStatus::Scraped),
            "agent_created" => Some(BusinessStatus::AgentCreated),
            "email_sent" => Some(BusinessStatus::EmailSent),
            "interested" => Some(BusinessStatus::Interested),
            "contacted" => Some(BusinessStatus::Contacted),
            "customer" => Some(BusinessStatus::Customer),
            "declined" => Some(BusinessStatus::Declined),
            _ => None,
        }
    }

    /// True once the pipeline has produced an assistant for the business.
    pub fn has_agent(&self) -> bool {
        !matches!(self, BusinessStatus::Pending | BusinessStatus::Scraped)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "SetNull"
    )]
    Customer,

    #[sea_orm(has_many = "super::lead_event::Entity")]
    LeadEvents,

    #[sea_orm(has_many = "super::phone_number::Entity")]
    PhoneNumbers,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::lead_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeadEvents.def()
    }
}

impl Related<super::phone_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhoneNumbers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Production businesses are linked to a customer and have been activated.
    pub fn is_production(&self) -> bool {
        self.production_customer_id().is_some()
    }

    /// The owning customer, for production businesses only.
    pub fn production_customer_id(&self) -> Option<Uuid> {
        self.customer_id
            .filter(|_| self.status == BusinessStatus::Customer)
    }

    /// Emailing a demo or activating requires an assistant and a demo slug.
    pub fn is_demo_ready(&self) -> bool {
        self.vapi_assistant_id.is_some() && self.slug.is_some()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services
            .as_ref()
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.website_url)
    }
}

/// Business as returned by the admin API (scraped markdown omitted)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BusinessResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub website_url: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub services: Vec<String>,
    pub opening_hours: Option<serde_json::Value>,
    pub status: BusinessStatus,
    pub vapi_assistant_id: Option<String>,
    pub voice_id: Option<String>,
    pub customer_id: Option<Uuid>,
    pub error_message: Option<String>,
    #[schema(value_type = Option<String>, example = "2025-06-01T12:00:00Z")]
    pub email_sent_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = String, example = "2025-06-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, example = "2025-06-01T12:05:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<Model> for BusinessResponse {
    fn from(model: Model) -> Self {
        let services = model.service_names();
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            website_url: model.website_url,
            industry: model.industry,
            description: model.description,
            address: model.address,
            phone: model.phone,
            email: model.email,
            services,
            opening_hours: model.opening_hours,
            status: model.status,
            vapi_assistant_id: model.vapi_assistant_id,
            voice_id: model.voice_id,
            customer_id: model.customer_id,
            error_message: model.error_message,
            email_sent_at: model.email_sent_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
