//! # Repository Layer
//!
//! Repositories own every query. Handlers and the pipeline construct them on
//! demand around a borrowed connection.

pub mod business;
pub mod call;
pub mod customer;
pub mod lead_event;
pub mod phone_number;
pub mod usage;
pub mod voice_option;

pub use business::{BusinessFilter, BusinessRepository, BusinessUpdate};
pub use call::{CallRepository, Upserted};
pub use customer::{CustomerRepository, SettingsUpdate};
pub use lead_event::LeadEventRepository;
pub use phone_number::{NewPhoneNumber, PhoneNumberRepository};
pub use usage::UsageRepository;
pub use voice_option::VoiceOptionRepository;
