//! PhoneNumber entity model
//!
//! A 46elks number provisioned for a production business.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::phone::format_swedish_number;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "phone_numbers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub business_id: Uuid,
    pub customer_id: Uuid,

    /// E.164 number callers dial
    #[sea_orm(unique)]
    pub number: String,

    /// Number id at 46elks
    pub elks_number_id: String,

    /// Phone number id at Vapi after import
    pub vapi_phone_number_id: Option<String>,

    /// Where 46elks connects inbound calls (the Vapi side of the pair)
    pub forwarding_number: String,

    /// active | released
    pub status: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id"
    )]
    Business,

    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoneNumberResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub number: String,
    /// Swedish display form, e.g. `08-123 45 67`
    pub display_number: String,
    pub status: String,
    #[schema(value_type = String, example = "2025-06-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for PhoneNumberResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            business_id: model.business_id,
            display_number: format_swedish_number(&model.number),
            number: model.number,
            status: model.status,
            created_at: model.created_at,
        }
    }
}
