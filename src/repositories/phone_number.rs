//! # Phone Number Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::phone_number::{self, Entity as PhoneNumber, Model};

pub const STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone)]
pub struct NewPhoneNumber {
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub number: String,
    pub elks_number_id: String,
    pub vapi_phone_number_id: Option<String>,
    pub forwarding_number: String,
}

pub struct PhoneNumberRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PhoneNumberRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewPhoneNumber) -> Result<Model, RepositoryError> {
        let now = Utc::now().into();
        phone_number::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(new.business_id),
            customer_id: Set(new.customer_id),
            number: Set(new.number),
            elks_number_id: Set(new.elks_number_id),
            vapi_phone_number_id: Set(new.vapi_phone_number_id),
            forwarding_number: Set(new.forwarding_number),
            status: Set(STATUS_ACTIVE.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    /// Active number row for an E.164 number.
    pub async fn find_active_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        PhoneNumber::find()
            .filter(phone_number::Column::Number.eq(number))
            .filter(phone_number::Column::Status.eq(STATUS_ACTIVE))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_active_for_business(
        &self,
        business_id: Uuid,
    ) -> Result<Option<Model>, RepositoryError> {
        PhoneNumber::find()
            .filter(phone_number::Column::BusinessId.eq(business_id))
            .filter(phone_number::Column::Status.eq(STATUS_ACTIVE))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        PhoneNumber::find()
            .filter(phone_number::Column::CustomerId.eq(customer_id))
            .order_by_asc(phone_number::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
