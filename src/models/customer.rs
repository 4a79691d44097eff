//! Customer entity model
//!
//! Account owner linked to an auth identity. Notification preferences live on
//! the customer row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Identity in the hosted auth service
    #[sea_orm(unique)]
    pub auth_user_id: Option<String>,

    #[sea_orm(unique)]
    pub email: String,

    pub name: Option<String>,
    pub phone: Option<String>,

    pub whatsapp_enabled: bool,

    /// E.164 destination for WhatsApp notifications
    pub whatsapp_number: Option<String>,

    pub telegram_enabled: bool,
    pub telegram_chat_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::business::Entity")]
    Businesses,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Notification settings exposed to the signed-in customer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSettings {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub whatsapp_enabled: bool,
    pub whatsapp_number: Option<String>,
    pub telegram_enabled: bool,
    pub telegram_chat_id: Option<String>,
    /// Voice used by the customer's assistants
    pub voice_id: Option<String>,
}

impl CustomerSettings {
    pub fn from_model(model: Model, voice_id: Option<String>) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            whatsapp_enabled: model.whatsapp_enabled,
            whatsapp_number: model.whatsapp_number,
            telegram_enabled: model.telegram_enabled,
            telegram_chat_id: model.telegram_chat_id,
            voice_id,
        }
    }
}
