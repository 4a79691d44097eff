mod test_utils;

use anythingvoice::error::RepositoryError;
use anythingvoice::models::business::BusinessStatus;
use anythingvoice::models::customer_call::{CallRecord, TranscriptTurn};
use anythingvoice::pipeline::prompt::ExtractedBusiness;
use anythingvoice::repositories::{
    BusinessFilter, BusinessRepository, CallRepository, CustomerRepository, LeadEventRepository,
    UsageRepository, VoiceOptionRepository, lead_event,
};
use anythingvoice::seeds::seed_voice_options;
use serde_json::json;
use test_utils::{create_demo_business, create_production_business, setup_test_db};

fn record(id: &str, seconds: i32) -> CallRecord {
    CallRecord {
        vapi_call_id: id.to_string(),
        caller_number: Some("+46701234567".to_string()),
        caller_name: Some("Anna".to_string()),
        started_at: None,
        ended_at: None,
        duration_seconds: seconds,
        transcript: vec![TranscriptTurn {
            role: "user".to_string(),
            content: "Hej!".to_string(),
            timestamp: Some(1.0),
        }],
        summary: None,
        sentiment: None,
        action_items: vec!["Ring upp".to_string()],
        recording_url: None,
        ended_reason: Some("customer-ended-call".to_string()),
        cost: 0.25,
    }
}

#[tokio::test]
async fn extraction_keeps_existing_fields_when_missing() {
    let db = setup_test_db().await.unwrap();
    let businesses = BusinessRepository::new(&db);
    let business = businesses.create_placeholder("https://optiker.se").await.unwrap();

    businesses
        .save_extraction(
            business.id,
            &ExtractedBusiness {
                name: "Optiker Öst".to_string(),
                phone: Some("08-555 123".to_string()),
                services: vec!["Synundersökning".to_string()],
                opening_hours: Some(json!({ "mon": "09-18" })),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let updated = businesses
        .save_extraction(
            business.id,
            &ExtractedBusiness {
                name: "Optiker Öst AB".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name.as_deref(), Some("Optiker Öst AB"));
    assert_eq!(updated.phone.as_deref(), Some("08-555 123"));
    assert_eq!(updated.service_names(), vec!["Synundersökning"]);
    assert_eq!(updated.opening_hours, Some(json!({ "mon": "09-18" })));
}

#[tokio::test]
async fn slug_reservation_conflicts_between_businesses() {
    let db = setup_test_db().await.unwrap();
    let businesses = BusinessRepository::new(&db);
    let first = businesses.create_placeholder("https://a.se").await.unwrap();
    let second = businesses.create_placeholder("https://b.se").await.unwrap();

    businesses.reserve_slug(first.id, "delad").await.unwrap();
    let err = businesses.reserve_slug(second.id, "delad").await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(businesses.slug_taken("delad", second.id).await.unwrap());
    assert!(!businesses.slug_taken("delad", first.id).await.unwrap());
}

#[tokio::test]
async fn list_filters_by_status() {
    let db = setup_test_db().await.unwrap();
    create_demo_business(&db, "https://x.se", "X", "x", "a-x").await.unwrap();
    BusinessRepository::new(&db)
        .create_placeholder("https://y.se")
        .await
        .unwrap();

    let (items, total) = BusinessRepository::new(&db)
        .list(&BusinessFilter {
            status: Some(BusinessStatus::Pending),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].website_url, "https://y.se");
}

#[tokio::test]
async fn customers_are_matched_case_insensitively() {
    let db = setup_test_db().await.unwrap();
    let customers = CustomerRepository::new(&db);

    let created = customers
        .find_or_create(" Kund@Exempel.SE ", None, Some("Kund"))
        .await
        .unwrap();
    assert_eq!(created.email, "kund@exempel.se");

    let linked = customers
        .find_or_create("kund@exempel.se", Some("auth-123"), None)
        .await
        .unwrap();
    assert_eq!(linked.id, created.id);
    assert_eq!(linked.auth_user_id.as_deref(), Some("auth-123"));

    // An existing identity is never replaced.
    let again = customers
        .find_or_create("KUND@exempel.se", Some("auth-999"), None)
        .await
        .unwrap();
    assert_eq!(again.auth_user_id.as_deref(), Some("auth-123"));
}

#[tokio::test]
async fn call_upsert_refreshes_without_resetting_flags() {
    let db = setup_test_db().await.unwrap();
    let (business, customer) = create_production_business(&db, "flaggor", "a-f").await.unwrap();
    let calls = CallRepository::new(&db);

    let first = calls
        .upsert_customer_call(customer.id, business.id, &record("c-1", 10))
        .await
        .unwrap();
    assert!(first.inserted);
    calls.mark_notified(first.model.id, true, false).await.unwrap();

    let second = calls
        .upsert_customer_call(customer.id, business.id, &record("c-1", 95))
        .await
        .unwrap();
    assert!(!second.inserted);
    assert_eq!(second.model.id, first.model.id);
    assert_eq!(second.model.duration_seconds, 95);
    assert!(second.model.whatsapp_sent);

    // Flags only move forward.
    let flags = calls.mark_notified(first.model.id, false, true).await.unwrap();
    assert!(flags.whatsapp_sent);
    assert!(flags.telegram_sent);
}

#[tokio::test]
async fn usage_accumulates_per_period() {
    let db = setup_test_db().await.unwrap();
    let (_, customer) = create_production_business(&db, "matare", "a-m").await.unwrap();
    let usage = UsageRepository::new(&db);

    usage.record_call(customer.id, "2025-05", 30, 0.1).await.unwrap();
    usage.record_call(customer.id, "2025-06", 45, 0.2).await.unwrap();
    let june = usage.record_call(customer.id, "2025-06", 20, 0.3).await.unwrap();

    assert_eq!(june.call_count, 2);
    assert_eq!(june.total_seconds, 65);
    assert!((june.total_cost - 0.5).abs() < 1e-9);

    let periods: Vec<String> = usage
        .list_for_customer(customer.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.period)
        .collect();
    assert_eq!(periods, vec!["2025-06", "2025-05"]);
}

#[tokio::test]
async fn overlapping_usage_increments_are_not_lost() {
    let db = setup_test_db().await.unwrap();
    let (_, customer) = create_production_business(&db, "samtidig", "a-s").await.unwrap();
    let usage = UsageRepository::new(&db);

    usage.record_call(customer.id, "2025-06", 10, 0.1).await.unwrap();
    let results = futures::future::join_all(
        (0..5).map(|_| usage.record_call(customer.id, "2025-06", 10, 0.1)),
    )
    .await;
    assert!(results.iter().all(Result::is_ok));

    let rows = usage.list_for_customer(customer.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].call_count, 6);
    assert_eq!(rows[0].total_seconds, 60);
    assert!((rows[0].total_cost - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn lead_events_are_listed_per_business() {
    let db = setup_test_db().await.unwrap();
    let businesses = BusinessRepository::new(&db);
    let one = businesses.create_placeholder("https://ett.se").await.unwrap();
    let two = businesses.create_placeholder("https://tva.se").await.unwrap();
    let events = LeadEventRepository::new(&db);

    events
        .append(one.id, lead_event::PIPELINE_STARTED, json!({}))
        .await
        .unwrap();
    events
        .append(one.id, lead_event::SCRAPED, json!({ "chars": 120 }))
        .await
        .unwrap();
    events
        .append(two.id, lead_event::PIPELINE_STARTED, json!({}))
        .await
        .unwrap();

    let listed = events.list_for_business(one.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| e.business_id == one.id));
}

#[tokio::test]
async fn voice_seeding_is_idempotent() {
    let db = setup_test_db().await.unwrap();

    let inserted = seed_voice_options(&db).await.unwrap();
    assert_eq!(inserted, 3);
    assert_eq!(seed_voice_options(&db).await.unwrap(), 0);

    let voices = VoiceOptionRepository::new(&db).list().await.unwrap();
    assert_eq!(voices.len(), 3);
    assert!(
        VoiceOptionRepository::new(&db)
            .find("sv-SE-SofieNeural")
            .await
            .unwrap()
            .is_some()
    );
}
