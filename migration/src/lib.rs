//! Database migrations for the AnythingVoice API.
//!
//! One migration per table, applied in dependency order.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_voice_options;
mod m2025_06_01_000002_create_customers;
mod m2025_06_01_000003_create_businesses;
mod m2025_06_01_000004_create_phone_numbers;
mod m2025_06_01_000005_create_customer_calls;
mod m2025_06_01_000006_create_demo_calls;
mod m2025_06_01_000007_create_lead_events;
mod m2025_06_01_000008_create_usage_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_voice_options::Migration),
            Box::new(m2025_06_01_000002_create_customers::Migration),
            Box::new(m2025_06_01_000003_create_businesses::Migration),
            Box::new(m2025_06_01_000004_create_phone_numbers::Migration),
            Box::new(m2025_06_01_000005_create_customer_calls::Migration),
            Box::new(m2025_06_01_000006_create_demo_calls::Migration),
            Box::new(m2025_06_01_000007_create_lead_events::Migration),
            Box::new(m2025_06_01_000008_create_usage_records::Migration),
        ]
    }
}
