//! # Business Repository
//!
//! All queries against the `businesses` table: pipeline state transitions,
//! admin listing and edits, and linking to customers.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::business::{self, BusinessStatus, Entity as Business, Model};
use crate::pipeline::prompt::ExtractedBusiness;

/// Filters for the admin business list
#[derive(Debug, Clone, Default)]
pub struct BusinessFilter {
    pub status: Option<BusinessStatus>,
    /// Matched against name, website and slug
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Editable fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct BusinessUpdate {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub services: Option<Vec<String>>,
    pub opening_hours: Option<serde_json::Value>,
    pub status: Option<BusinessStatus>,
}

pub struct BusinessRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BusinessRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a `pending` row for a URL that has just entered the pipeline.
    pub async fn create_placeholder(&self, website_url: &str) -> Result<Model, RepositoryError> {
        let now = Utc::now().into();
        business::ActiveModel {
            id: Set(Uuid::new_v4()),
            website_url: Set(website_url.to_string()),
            status: Set(BusinessStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Business::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Like [`find_by_id`](Self::find_by_id) but missing rows are an error.
    pub async fn get(&self, id: Uuid) -> Result<Model, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("business"))
    }

    /// Most recently created business for a normalized website URL.
    pub async fn find_by_website_url(&self, url: &str) -> Result<Option<Model>, RepositoryError> {
        Business::find()
            .filter(business::Column::WebsiteUrl.eq(url))
            .order_by_desc(business::Column::CreatedAt)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Model>, RepositoryError> {
        Business::find()
            .filter(business::Column::Slug.eq(slug))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_assistant_id(
        &self,
        assistant_id: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        Business::find()
            .filter(business::Column::VapiAssistantId.eq(assistant_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// True when another business already owns `slug`.
    pub async fn slug_taken(&self, slug: &str, except: Uuid) -> Result<bool, RepositoryError> {
        let count = Business::find()
            .filter(business::Column::Slug.eq(slug))
            .filter(business::Column::Id.ne(except))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    /// Newest first, with the total row count for the filter.
    pub async fn list(&self, filter: &BusinessFilter) -> Result<(Vec<Model>, u64), RepositoryError> {
        let mut query = Business::find();

        if let Some(status) = filter.status {
            query = query.filter(business::Column::Status.eq(status));
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(business::Column::Name.contains(search))
                    .add(business::Column::WebsiteUrl.contains(search))
                    .add(business::Column::Slug.contains(search)),
            );
        }

        let total = query
            .clone()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let items = query
            .order_by_desc(business::Column::CreatedAt)
            .order_by_desc(business::Column::Id)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((items, total))
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Business::find()
            .filter(business::Column::CustomerId.eq(customer_id))
            .order_by_asc(business::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Stores scraped markdown and moves the business to `scraped`.
    pub async fn save_scrape(&self, id: Uuid, markdown: &str) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.scraped_markdown = Set(Some(markdown.to_string()));
        active.status = Set(BusinessStatus::Scraped);
        active.error_message = Set(None);
        self.touch_and_save(active).await
    }

    /// Copies LLM-extracted fields onto the business. Existing values are kept
    /// where the extraction has nothing.
    pub async fn save_extraction(
        &self,
        id: Uuid,
        extracted: &ExtractedBusiness,
    ) -> Result<Model, RepositoryError> {
        let current = self.get(id).await?;
        let mut active = current.clone().into_active_model();

        active.name = Set(Some(extracted.name.clone()));
        active.industry = Set(extracted.industry.clone().or(current.industry));
        active.description = Set(extracted.description.clone().or(current.description));
        active.address = Set(extracted.address.clone().or(current.address));
        active.phone = Set(extracted.phone.clone().or(current.phone));
        active.email = Set(extracted.email.clone().or(current.email));
        if !extracted.services.is_empty() {
            active.services = Set(Some(serde_json::json!(extracted.services)));
        }
        if extracted.opening_hours.is_some() {
            active.opening_hours = Set(extracted.opening_hours.clone());
        }

        self.touch_and_save(active).await
    }

    /// Claims `slug` for the business. A concurrent claim of the same slug
    /// fails with [`RepositoryError::Conflict`].
    pub async fn reserve_slug(&self, id: Uuid, slug: &str) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.slug = Set(Some(slug.to_string()));
        self.touch_and_save(active).await
    }

    /// Final pipeline step: slug and assistant assigned, status `agent_created`.
    pub async fn mark_agent_created(
        &self,
        id: Uuid,
        slug: &str,
        assistant_id: &str,
        voice_id: &str,
    ) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.slug = Set(Some(slug.to_string()));
        active.vapi_assistant_id = Set(Some(assistant_id.to_string()));
        active.voice_id = Set(Some(voice_id.to_string()));
        active.status = Set(BusinessStatus::AgentCreated);
        active.error_message = Set(None);
        self.touch_and_save(active).await
    }

    /// Records a pipeline failure without changing the status.
    pub async fn record_failure(&self, id: Uuid, message: &str) -> Result<(), RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.error_message = Set(Some(message.to_string()));
        self.touch_and_save(active).await.map(|_| ())
    }

    pub async fn update(&self, id: Uuid, update: BusinessUpdate) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();

        if let Some(name) = update.name {
            active.name = Set(Some(name));
        }
        if let Some(industry) = update.industry {
            active.industry = Set(Some(industry));
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(address) = update.address {
            active.address = Set(Some(address));
        }
        if let Some(phone) = update.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = update.email {
            active.email = Set(Some(email));
        }
        if let Some(services) = update.services {
            active.services = Set(Some(serde_json::json!(services)));
        }
        if let Some(opening_hours) = update.opening_hours {
            active.opening_hours = Set(Some(opening_hours));
        }
        if let Some(status) = update.status {
            active.status = Set(status);
        }

        self.touch_and_save(active).await
    }

    pub async fn mark_email_sent(&self, id: Uuid) -> Result<Model, RepositoryError> {
        let now = Utc::now().into();
        let mut active = self.get(id).await?.into_active_model();
        active.status = Set(BusinessStatus::EmailSent);
        active.email_sent_at = Set(Some(now));
        self.touch_and_save(active).await
    }

    /// Links the business to its customer and moves it to production.
    pub async fn activate(&self, id: Uuid, customer_id: Uuid) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.customer_id = Set(Some(customer_id));
        active.status = Set(BusinessStatus::Customer);
        self.touch_and_save(active).await
    }

    pub async fn set_voice(&self, id: Uuid, voice_id: &str) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.voice_id = Set(Some(voice_id.to_string()));
        self.touch_and_save(active).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = Business::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("business"));
        }
        Ok(())
    }

    async fn touch_and_save(&self, mut active: business::ActiveModel) -> Result<Model, RepositoryError> {
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
