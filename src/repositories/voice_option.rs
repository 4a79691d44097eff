//! # Voice Option Repository

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};

use crate::error::RepositoryError;
use crate::models::voice_option::{self, Entity as VoiceOption, Model};

pub struct VoiceOptionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> VoiceOptionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Catalogue in display order.
    pub async fn list(&self) -> Result<Vec<Model>, RepositoryError> {
        VoiceOption::find()
            .order_by_asc(voice_option::Column::SortOrder)
            .order_by_asc(voice_option::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Model>, RepositoryError> {
        VoiceOption::find_by_id(id.to_string())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, voice: voice_option::ActiveModel) -> Result<Model, RepositoryError> {
        voice
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
