//! Shared fixtures for integration tests: an in-memory SQLite database with
//! migrations applied, plus helpers that insert businesses, customers and
//! phone numbers in the states the tests need.

#![allow(dead_code)]

use anyhow::Result;
use anythingvoice::models::business::{BusinessStatus, Model as Business};
use anythingvoice::models::customer::Model as Customer;
use anythingvoice::models::phone_number::Model as PhoneNumber;
use anythingvoice::repositories::{
    BusinessRepository, BusinessUpdate, CustomerRepository, NewPhoneNumber, PhoneNumberRepository,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

pub const OPERATOR_TOKEN: &str = "test-operator-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Fixtures insert calls and numbers without every parent row.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Config suitable for routing tests: local profile, one operator token, no
/// provider credentials and no webhook secrets.
pub fn test_config() -> anythingvoice::config::AppConfig {
    anythingvoice::config::AppConfig {
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        public_base_url: "https://app.example.se".to_string(),
        ..Default::default()
    }
}

/// A business that went through the pipeline: named, slugged and with an assistant.
pub async fn create_demo_business(
    db: &DatabaseConnection,
    website_url: &str,
    name: &str,
    slug: &str,
    assistant_id: &str,
) -> Result<Business> {
    let businesses = BusinessRepository::new(db);
    let business = businesses.create_placeholder(website_url).await?;
    businesses
        .update(
            business.id,
            BusinessUpdate {
                name: Some(name.to_string()),
                email: Some(format!("info@{}.se", slug)),
                ..Default::default()
            },
        )
        .await?;
    let business = businesses
        .mark_agent_created(business.id, slug, assistant_id, "sv-SE-SofieNeural")
        .await?;
    Ok(business)
}

pub async fn create_customer(db: &DatabaseConnection, email: &str) -> Result<Customer> {
    Ok(CustomerRepository::new(db)
        .find_or_create(email, None, Some("Testkund"))
        .await?)
}

/// A demo business linked to a fresh customer and moved to `customer`.
pub async fn create_production_business(
    db: &DatabaseConnection,
    slug: &str,
    assistant_id: &str,
) -> Result<(Business, Customer)> {
    let business = create_demo_business(
        db,
        &format!("https://{}.se", slug),
        "Produktion AB",
        slug,
        assistant_id,
    )
    .await?;
    let customer = create_customer(db, &format!("agare@{}.se", slug)).await?;
    let business = BusinessRepository::new(db)
        .activate(business.id, customer.id)
        .await?;
    assert_eq!(business.status, BusinessStatus::Customer);
    Ok((business, customer))
}

pub async fn create_phone_number(
    db: &DatabaseConnection,
    business: &Business,
    customer: &Customer,
    number: &str,
) -> Result<PhoneNumber> {
    Ok(PhoneNumberRepository::new(db)
        .create(NewPhoneNumber {
            business_id: business.id,
            customer_id: customer.id,
            number: number.to_string(),
            elks_number_id: "n1234".to_string(),
            vapi_phone_number_id: Some("vapi-phone-1".to_string()),
            forwarding_number: "sip:+46766861234@sip.vapi.ai".to_string(),
        })
        .await?)
}
