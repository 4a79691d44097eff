//! LeadEvent entity model
//!
//! Append-only audit trail of what happened to a business.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lead_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub business_id: Uuid,

    /// e.g. pipeline_started, scraped, agent_created, email_sent, activated
    pub event_type: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id",
        on_delete = "Cascade"
    )]
    Business,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeadEventResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub event_type: String,
    pub metadata: serde_json::Value,
    #[schema(value_type = String, example = "2025-06-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for LeadEventResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            business_id: model.business_id,
            event_type: model.event_type,
            metadata: model.metadata,
            created_at: model.created_at,
        }
    }
}
