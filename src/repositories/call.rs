//! # Call Repository
//!
//! Customer and demo call records. Both tables are keyed by the provider's
//! call id so that a redelivered end-of-call report updates the existing row
//! instead of inserting a duplicate.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::customer_call::{self, CallRecord, Entity as CustomerCall};
use crate::models::demo_call::{self, Entity as DemoCall};

/// Result of an upsert; `inserted` is false when the row already existed.
#[derive(Debug, Clone)]
pub struct Upserted<M> {
    pub model: M,
    pub inserted: bool,
}

pub struct CallRepository<'a, C: ConnectionTrait = DatabaseConnection> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CallRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_customer_call_by_vapi_id(
        &self,
        vapi_call_id: &str,
    ) -> Result<Option<customer_call::Model>, RepositoryError> {
        CustomerCall::find()
            .filter(customer_call::Column::VapiCallId.eq(vapi_call_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Inserts or refreshes the production call identified by `record.vapi_call_id`.
    /// Notification flags of an existing row are preserved.
    pub async fn upsert_customer_call(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        record: &CallRecord,
    ) -> Result<Upserted<customer_call::Model>, RepositoryError> {
        if let Some(existing) = self.find_customer_call_by_vapi_id(&record.vapi_call_id).await? {
            let model = self.refresh_customer_call(existing, record).await?;
            return Ok(Upserted {
                model,
                inserted: false,
            });
        }

        let now = Utc::now().into();
        let inserted = customer_call::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            business_id: Set(business_id),
            vapi_call_id: Set(record.vapi_call_id.clone()),
            caller_number: Set(record.caller_number.clone()),
            caller_name: Set(record.caller_name.clone()),
            started_at: Set(record.started_at),
            ended_at: Set(record.ended_at),
            duration_seconds: Set(record.duration_seconds),
            transcript: Set(serde_json::json!(record.transcript)),
            summary: Set(record.summary.clone()),
            sentiment: Set(record.sentiment.clone()),
            action_items: Set(serde_json::json!(record.action_items)),
            recording_url: Set(record.recording_url.clone()),
            ended_reason: Set(record.ended_reason.clone()),
            cost: Set(record.cost),
            whatsapp_sent: Set(false),
            telegram_sent: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await;

        match inserted {
            Ok(model) => Ok(Upserted {
                model,
                inserted: true,
            }),
            // Concurrent redelivery won the insert.
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_customer_call_by_vapi_id(&record.vapi_call_id)
                    .await?
                    .ok_or_else(|| RepositoryError::not_found("customer call"))?;
                let model = self.refresh_customer_call(existing, record).await?;
                Ok(Upserted {
                    model,
                    inserted: false,
                })
            }
            Err(err) => Err(RepositoryError::database_error(err)),
        }
    }

    async fn refresh_customer_call(
        &self,
        existing: customer_call::Model,
        record: &CallRecord,
    ) -> Result<customer_call::Model, RepositoryError> {
        let mut active = existing.into_active_model();
        active.caller_number = Set(record.caller_number.clone());
        active.caller_name = Set(record.caller_name.clone());
        active.started_at = Set(record.started_at);
        active.ended_at = Set(record.ended_at);
        active.duration_seconds = Set(record.duration_seconds);
        active.transcript = Set(serde_json::json!(record.transcript));
        active.summary = Set(record.summary.clone());
        active.sentiment = Set(record.sentiment.clone());
        active.action_items = Set(serde_json::json!(record.action_items));
        active.recording_url = Set(record.recording_url.clone());
        active.ended_reason = Set(record.ended_reason.clone());
        active.cost = Set(record.cost);
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Persists notification outcomes. Flags only ever go from false to true.
    pub async fn mark_notified(
        &self,
        call_id: Uuid,
        whatsapp_sent: bool,
        telegram_sent: bool,
    ) -> Result<customer_call::Model, RepositoryError> {
        let existing = CustomerCall::find_by_id(call_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("customer call"))?;

        let whatsapp_sent = existing.whatsapp_sent || whatsapp_sent;
        let telegram_sent = existing.telegram_sent || telegram_sent;

        let mut active = existing.into_active_model();
        active.whatsapp_sent = Set(whatsapp_sent);
        active.telegram_sent = Set(telegram_sent);
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Newest first, with the customer's total call count.
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<customer_call::Model>, u64), RepositoryError> {
        let query = CustomerCall::find().filter(customer_call::Column::CustomerId.eq(customer_id));

        let total = query
            .clone()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let calls = query
            .order_by_desc(customer_call::Column::CreatedAt)
            .order_by_desc(customer_call::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((calls, total))
    }

    /// A single call, visible only to the customer that owns it.
    pub async fn find_for_customer(
        &self,
        customer_id: Uuid,
        call_id: Uuid,
    ) -> Result<Option<customer_call::Model>, RepositoryError> {
        CustomerCall::find_by_id(call_id)
            .filter(customer_call::Column::CustomerId.eq(customer_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_demo_call_by_vapi_id(
        &self,
        vapi_call_id: &str,
    ) -> Result<Option<demo_call::Model>, RepositoryError> {
        DemoCall::find()
            .filter(demo_call::Column::VapiCallId.eq(vapi_call_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn upsert_demo_call(
        &self,
        business_id: Uuid,
        record: &CallRecord,
    ) -> Result<Upserted<demo_call::Model>, RepositoryError> {
        if let Some(existing) = self.find_demo_call_by_vapi_id(&record.vapi_call_id).await? {
            let model = self.refresh_demo_call(existing, record).await?;
            return Ok(Upserted {
                model,
                inserted: false,
            });
        }

        let inserted = demo_call::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            vapi_call_id: Set(record.vapi_call_id.clone()),
            caller_number: Set(record.caller_number.clone()),
            started_at: Set(record.started_at),
            ended_at: Set(record.ended_at),
            duration_seconds: Set(record.duration_seconds),
            transcript: Set(serde_json::json!(record.transcript)),
            summary: Set(record.summary.clone()),
            recording_url: Set(record.recording_url.clone()),
            ended_reason: Set(record.ended_reason.clone()),
            cost: Set(record.cost),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await;

        match inserted {
            Ok(model) => Ok(Upserted {
                model,
                inserted: true,
            }),
            Err(err) if is_unique_violation(&err) => {
                let existing = self
                    .find_demo_call_by_vapi_id(&record.vapi_call_id)
                    .await?
                    .ok_or_else(|| RepositoryError::not_found("demo call"))?;
                let model = self.refresh_demo_call(existing, record).await?;
                Ok(Upserted {
                    model,
                    inserted: false,
                })
            }
            Err(err) => Err(RepositoryError::database_error(err)),
        }
    }

    async fn refresh_demo_call(
        &self,
        existing: demo_call::Model,
        record: &CallRecord,
    ) -> Result<demo_call::Model, RepositoryError> {
        let mut active = existing.into_active_model();
        active.caller_number = Set(record.caller_number.clone());
        active.started_at = Set(record.started_at);
        active.ended_at = Set(record.ended_at);
        active.duration_seconds = Set(record.duration_seconds);
        active.transcript = Set(serde_json::json!(record.transcript));
        active.summary = Set(record.summary.clone());
        active.recording_url = Set(record.recording_url.clone());
        active.ended_reason = Set(record.ended_reason.clone());
        active.cost = Set(record.cost);
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
