//! # Data Models
//!
//! SeaORM entities and the API views built from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod business;
pub mod customer;
pub mod customer_call;
pub mod demo_call;
pub mod lead_event;
pub mod phone_number;
pub mod usage_record;
pub mod voice_option;

pub use business::Entity as Business;
pub use customer::Entity as Customer;
pub use customer_call::Entity as CustomerCall;
pub use demo_call::Entity as DemoCall;
pub use lead_event::Entity as LeadEvent;
pub use phone_number::Entity as PhoneNumber;
pub use usage_record::Entity as UsageRecord;
pub use voice_option::Entity as VoiceOption;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "anythingvoice".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
