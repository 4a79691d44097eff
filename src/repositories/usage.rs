//! # Usage Repository
//!
//! Monthly aggregates keyed by customer and `YYYY-MM` period.

use chrono::{DateTime, Datelike, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::usage_record::{self, Column, Entity as UsageRecord, Model};

/// `YYYY-MM` period a timestamp falls into.
pub fn period_for(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Works on a pool or inside a transaction.
pub struct UsageRepository<'a, C: ConnectionTrait = DatabaseConnection> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UsageRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Adds one call to the customer's row for `period`, creating it on first use.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` with the increments computed
    /// by the database, so overlapping calls never lose an update.
    pub async fn record_call(
        &self,
        customer_id: Uuid,
        period: &str,
        duration_seconds: i64,
        cost: f64,
    ) -> Result<Model, RepositoryError> {
        let seconds = duration_seconds.max(0);
        let cost = cost.max(0.0);
        let now = Utc::now().into();

        let row = usage_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            period: Set(period.to_string()),
            call_count: Set(1),
            total_seconds: Set(seconds),
            total_cost: Set(cost),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let on_conflict = OnConflict::columns([Column::CustomerId, Column::Period])
            .value(
                Column::CallCount,
                Expr::col((UsageRecord, Column::CallCount)).add(1),
            )
            .value(
                Column::TotalSeconds,
                Expr::col((UsageRecord, Column::TotalSeconds)).add(seconds),
            )
            .value(
                Column::TotalCost,
                Expr::col((UsageRecord, Column::TotalCost)).add(cost),
            )
            .update_column(Column::UpdatedAt)
            .to_owned();

        UsageRecord::insert(row)
            .on_conflict(on_conflict)
            .exec_without_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        self.find(customer_id, period)
            .await?
            .ok_or_else(|| RepositoryError::not_found("usage record"))
    }

    /// Newest period first.
    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        UsageRecord::find()
            .filter(Column::CustomerId.eq(customer_id))
            .order_by_desc(Column::Period)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn find(&self, customer_id: Uuid, period: &str) -> Result<Option<Model>, RepositoryError> {
        UsageRecord::find()
            .filter(Column::CustomerId.eq(customer_id))
            .filter(Column::Period.eq(period))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn period_is_zero_padded() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(period_for(at), "2025-03");
    }
}
