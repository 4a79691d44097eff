//! # Lead Event Repository
//!
//! Append-only; rows are never updated.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::lead_event::{self, Entity as LeadEvent, Model};

pub const PIPELINE_STARTED: &str = "pipeline_started";
pub const SCRAPED: &str = "scraped";
pub const EXTRACTED: &str = "extracted";
pub const AGENT_CREATED: &str = "agent_created";
pub const PIPELINE_FAILED: &str = "pipeline_failed";
pub const EMAIL_SENT: &str = "email_sent";
pub const ACTIVATED: &str = "activated";
pub const STATUS_CHANGED: &str = "status_changed";
pub const DEMO_CALL_COMPLETED: &str = "demo_call_completed";
pub const CALL_HANGUP: &str = "call_hangup";

pub struct LeadEventRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeadEventRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn append(
        &self,
        business_id: Uuid,
        event_type: &str,
        metadata: Value,
    ) -> Result<Model, RepositoryError> {
        lead_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            event_type: Set(event_type.to_string()),
            metadata: Set(metadata),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    /// Newest first.
    pub async fn list_for_business(&self, business_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        LeadEvent::find()
            .filter(lead_event::Column::BusinessId.eq(business_id))
            .order_by_desc(lead_event::Column::CreatedAt)
            .order_by_desc(lead_event::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
