//! # Customer Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::customer::{self, Entity as Customer, Model};

/// Notification settings change; `None` leaves a field untouched. The inner
/// `Option` of destinations allows clearing them.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub name: Option<String>,
    pub whatsapp_enabled: Option<bool>,
    pub whatsapp_number: Option<Option<String>>,
    pub telegram_enabled: Option<bool>,
    pub telegram_chat_id: Option<Option<String>>,
}

pub struct CustomerRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CustomerRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Customer::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Model, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("customer"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Model>, RepositoryError> {
        Customer::find()
            .filter(customer::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Returns the customer for `email`, creating it when missing. A known
    /// customer without an auth identity picks up `auth_user_id`.
    pub async fn find_or_create(
        &self,
        email: &str,
        auth_user_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Model, RepositoryError> {
        let email = email.trim().to_lowercase();

        if let Some(existing) = self.find_by_email(&email).await? {
            if existing.auth_user_id.is_none()
                && let Some(auth_user_id) = auth_user_id
            {
                let mut active = existing.into_active_model();
                active.auth_user_id = Set(Some(auth_user_id.to_string()));
                active.updated_at = Set(Utc::now().into());
                return active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error);
            }
            return Ok(existing);
        }

        let now = Utc::now().into();
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            auth_user_id: Set(auth_user_id.map(str::to_string)),
            email: Set(email),
            name: Set(name.map(str::to_string)),
            phone: Set(None),
            whatsapp_enabled: Set(false),
            whatsapp_number: Set(None),
            telegram_enabled: Set(false),
            telegram_chat_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn update_settings(
        &self,
        id: Uuid,
        update: SettingsUpdate,
    ) -> Result<Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();

        if let Some(name) = update.name {
            active.name = Set(Some(name));
        }
        if let Some(enabled) = update.whatsapp_enabled {
            active.whatsapp_enabled = Set(enabled);
        }
        if let Some(number) = update.whatsapp_number {
            active.whatsapp_number = Set(number);
        }
        if let Some(enabled) = update.telegram_enabled {
            active.telegram_enabled = Set(enabled);
        }
        if let Some(chat_id) = update.telegram_chat_id {
            active.telegram_chat_id = Set(chat_id);
        }

        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
