//! VoiceOption entity model
//!
//! Reference catalogue of synthetic voices a customer can pick from.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "voice_options")]
pub struct Model {
    /// Voice id at the speech provider (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Speech provider, e.g. `11labs` or `azure`
    pub provider: String,

    pub gender: Option<String>,
    pub language: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub sort_order: i32,

    #[schema(value_type = String, example = "2025-06-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
