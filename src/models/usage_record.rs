//! UsageRecord entity model
//!
//! Monthly call aggregate per customer, keyed by (`customer_id`, `period`).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub customer_id: Uuid,

    /// Calendar month, `YYYY-MM`
    pub period: String,

    pub call_count: i32,
    pub total_seconds: i64,
    pub total_cost: f64,
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
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageResponse {
    pub period: String,
    pub call_count: i32,
    pub total_seconds: i64,
    /// Whole minutes, rounded up
    pub total_minutes: i64,
    pub total_cost: f64,
}

impl From<Model> for UsageResponse {
    fn from(model: Model) -> Self {
        Self {
            period: model.period,
            call_count: model.call_count,
            total_minutes: (model.total_seconds + 59) / 60,
            total_seconds: model.total_seconds,
            total_cost: model.total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn minutes_round_up() {
        let now = Utc::now().fixed_offset();
        let model = Model {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            period: "2025-06".to_string(),
            call_count: 2,
            total_seconds: 61,
            total_cost: 0.4,
            created_at: now,
            updated_at: now,
        };
        let response = UsageResponse::from(model);
        assert_eq!(response.total_minutes, 2);
    }
}
