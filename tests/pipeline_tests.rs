mod test_utils;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anythingvoice::integrations::ProviderError;
use anythingvoice::integrations::vapi::AssistantSpec;
use anythingvoice::models::business::BusinessStatus;
use anythingvoice::pipeline::prompt::ExtractedBusiness;
use anythingvoice::pipeline::retry::RetryPolicy;
use anythingvoice::pipeline::{
    AssistantProvisioner, BusinessExtractor, Pipeline, PipelineSettings, ScrapedPage, Scraper,
};
use anythingvoice::repositories::{BusinessRepository, LeadEventRepository, lead_event};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use test_utils::setup_test_db;

/// Serves markdown per URL; URLs listed in `flaky` fail with a rate limit
/// the given number of times first, URLs in `broken` always fail with 404.
#[derive(Default)]
struct FakeScraper {
    flaky: Mutex<HashMap<String, u32>>,
    broken: Vec<String>,
    calls: AtomicU32,
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.broken.iter().any(|b| b == url) {
            return Err(ProviderError::Http {
                provider: "firecrawl",
                status: 404,
                body: "not found".to_string(),
            });
        }

        let mut flaky = self.flaky.lock().unwrap();
        if let Some(remaining) = flaky.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(ProviderError::Http {
                provider: "firecrawl",
                status: 429,
                body: "rate limit exceeded".to_string(),
            });
        }

        Ok(ScrapedPage {
            markdown: format!("# Välkommen\nSida för {}", url),
            title: Some("Välkommen".to_string()),
            description: None,
        })
    }
}

/// Names every site after the first label of its host, unless overridden.
#[derive(Default)]
struct FakeExtractor {
    names: HashMap<String, String>,
}

#[async_trait]
impl BusinessExtractor for FakeExtractor {
    async fn extract(&self, url: &str, _markdown: &str) -> Result<ExtractedBusiness, ProviderError> {
        let name = self.names.get(url).cloned().unwrap_or_else(|| {
            url.trim_start_matches("https://")
                .split('.')
                .next()
                .unwrap_or("okänd")
                .to_string()
        });
        Ok(ExtractedBusiness {
            name,
            industry: Some("frisör".to_string()),
            services: vec!["Klippning".to_string(), "Färgning".to_string()],
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct FakeProvisioner {
    specs: Mutex<Vec<AssistantSpec>>,
    fail: bool,
}

#[async_trait]
impl AssistantProvisioner for FakeProvisioner {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Http {
                provider: "vapi",
                status: 400,
                body: "invalid voice".to_string(),
            });
        }
        let mut specs = self.specs.lock().unwrap();
        specs.push(spec.clone());
        Ok(format!("asst-{}", specs.len()))
    }
}

fn settings(batch_size: usize) -> PipelineSettings {
    PipelineSettings {
        batch_size,
        batch_delay: Duration::from_millis(5),
        scrape_retry: RetryPolicy::new(3, Duration::from_millis(1)),
        default_voice_id: "sv-SE-SofieNeural".to_string(),
        webhook_url: "https://app.example.se/api/webhooks/vapi".to_string(),
        webhook_secret: Some("vapi-secret".to_string()),
    }
}

fn pipeline(
    db: &DatabaseConnection,
    scraper: Arc<FakeScraper>,
    extractor: Arc<FakeExtractor>,
    provisioner: Arc<FakeProvisioner>,
    batch_size: usize,
) -> Pipeline {
    Pipeline::new(db.clone(), scraper, extractor, provisioner, settings(batch_size))
}

#[tokio::test]
async fn single_url_creates_business_with_assistant() {
    let db = setup_test_db().await.unwrap();
    let provisioner = Arc::new(FakeProvisioner::default());
    let pipeline = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor {
            names: HashMap::from([(
                "https://frisorlisa.se".to_string(),
                "Frisör Lisa".to_string(),
            )]),
        }),
        provisioner.clone(),
        5,
    );

    let outcome = pipeline.run_single(" frisorlisa.se ").await;

    assert!(outcome.succeeded(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.slug.as_deref(), Some("frisor-lisa"));
    assert_eq!(outcome.status, Some(BusinessStatus::AgentCreated));
    assert_eq!(outcome.assistant_id.as_deref(), Some("asst-1"));
    assert!(!outcome.reused);

    let business = BusinessRepository::new(&db)
        .get(outcome.business_id.unwrap())
        .await
        .unwrap();
    assert_eq!(business.website_url, "https://frisorlisa.se");
    assert_eq!(business.name.as_deref(), Some("Frisör Lisa"));
    assert_eq!(business.voice_id.as_deref(), Some("sv-SE-SofieNeural"));
    assert!(business.scraped_markdown.is_some());
    assert!(business.is_demo_ready());

    let specs = provisioner.specs.lock().unwrap();
    assert_eq!(specs[0].voice_provider, "azure");
    assert_eq!(specs[0].server_url, "https://app.example.se/api/webhooks/vapi");
    assert!(specs[0].system_prompt.contains("Frisör Lisa"));

    let events: Vec<String> = LeadEventRepository::new(&db)
        .list_for_business(business.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    for expected in [
        lead_event::PIPELINE_STARTED,
        lead_event::SCRAPED,
        lead_event::EXTRACTED,
        lead_event::AGENT_CREATED,
    ] {
        assert!(events.iter().any(|e| e == expected), "missing {expected}");
    }
}

#[tokio::test]
async fn batch_returns_one_result_per_url_in_order() {
    let db = setup_test_db().await.unwrap();
    let scraper = Arc::new(FakeScraper {
        broken: vec!["https://trasig.se".to_string()],
        ..Default::default()
    });
    let pipeline = pipeline(
        &db,
        scraper,
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeProvisioner::default()),
        2,
    );

    let urls: Vec<String> = ["alfa.se", "not a url", "trasig.se", "beta.se", "gamma.se"]
        .iter()
        .map(|u| u.to_string())
        .collect();
    let batch = pipeline.run_batch(&urls).await;

    assert_eq!(batch.total, 5);
    assert_eq!(batch.succeeded, 3);
    assert_eq!(batch.failed, 2);
    let submitted: Vec<&str> = batch.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(submitted, vec!["alfa.se", "not a url", "trasig.se", "beta.se", "gamma.se"]);

    let invalid = &batch.results[1];
    assert!(invalid.business_id.is_none());
    assert!(invalid.error.is_some());

    // Failed scrape keeps the row in `pending` with the error recorded.
    let broken = &batch.results[2];
    assert_eq!(broken.status, Some(BusinessStatus::Pending));
    let row = BusinessRepository::new(&db)
        .get(broken.business_id.unwrap())
        .await
        .unwrap();
    assert!(row.error_message.as_deref().unwrap_or_default().contains("404"));
    let events = LeadEventRepository::new(&db)
        .list_for_business(row.id)
        .await
        .unwrap();
    let failure = events
        .iter()
        .find(|e| e.event_type == lead_event::PIPELINE_FAILED)
        .expect("failure event");
    assert_eq!(failure.metadata["step"], "scrape");
}

#[tokio::test]
async fn same_name_gets_numbered_slugs() {
    let db = setup_test_db().await.unwrap();
    let names = HashMap::from([
        ("https://salong-ett.se".to_string(), "Salong Lugn".to_string()),
        ("https://salong-tva.se".to_string(), "Salong Lugn".to_string()),
        ("https://salong-tre.se".to_string(), "Salong Lugn".to_string()),
    ]);
    let pipeline = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor { names }),
        Arc::new(FakeProvisioner::default()),
        1,
    );

    let urls: Vec<String> = ["salong-ett.se", "salong-tva.se", "salong-tre.se"]
        .iter()
        .map(|u| u.to_string())
        .collect();
    let batch = pipeline.run_batch(&urls).await;

    let slugs: Vec<_> = batch
        .results
        .iter()
        .map(|r| r.slug.clone().unwrap_or_default())
        .collect();
    assert_eq!(slugs, vec!["salong-lugn", "salong-lugn-2", "salong-lugn-3"]);
}

#[tokio::test]
async fn concurrent_runs_never_share_a_slug() {
    let db = setup_test_db().await.unwrap();
    let names = (1..=4)
        .map(|i| (format!("https://kopia{}.se", i), "Samma Namn".to_string()))
        .collect();
    let pipeline = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor { names }),
        Arc::new(FakeProvisioner::default()),
        4,
    );

    let urls: Vec<String> = (1..=4).map(|i| format!("kopia{}.se", i)).collect();
    let batch = pipeline.run_batch(&urls).await;

    let mut slugs: Vec<String> = batch
        .results
        .iter()
        .filter_map(|r| r.slug.clone())
        .collect();
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), batch.succeeded);
    assert!(slugs.iter().all(|s| s.starts_with("samma-namn")));
}

#[tokio::test]
async fn rate_limited_scrape_is_retried() {
    let db = setup_test_db().await.unwrap();
    let scraper = Arc::new(FakeScraper {
        flaky: Mutex::new(HashMap::from([("https://seg.se".to_string(), 2)])),
        ..Default::default()
    });
    let pipeline = pipeline(
        &db,
        scraper.clone(),
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeProvisioner::default()),
        5,
    );

    let outcome = pipeline.run_single("seg.se").await;

    assert!(outcome.succeeded(), "unexpected error: {:?}", outcome.error);
    assert_eq!(scraper.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn not_found_scrape_is_not_retried() {
    let db = setup_test_db().await.unwrap();
    let scraper = Arc::new(FakeScraper {
        broken: vec!["https://borta.se".to_string()],
        ..Default::default()
    });
    let pipeline = pipeline(
        &db,
        scraper.clone(),
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeProvisioner::default()),
        5,
    );

    let outcome = pipeline.run_single("borta.se").await;

    assert!(!outcome.succeeded());
    assert_eq!(scraper.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rerun_reuses_business_with_assistant() {
    let db = setup_test_db().await.unwrap();
    let provisioner = Arc::new(FakeProvisioner::default());
    let pipeline = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor::default()),
        provisioner.clone(),
        5,
    );

    let first = pipeline.run_single("https://klinik.se").await;
    let second = pipeline.run_single("klinik.se/").await;

    assert!(second.reused);
    assert_eq!(second.business_id, first.business_id);
    assert_eq!(second.assistant_id, first.assistant_id);
    assert_eq!(provisioner.specs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_assistant_keeps_business_retryable() {
    let db = setup_test_db().await.unwrap();
    let failing = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeProvisioner {
            fail: true,
            ..Default::default()
        }),
        5,
    );

    let failed = failing.run_single("verkstad.se").await;
    assert!(!failed.succeeded());
    assert_eq!(failed.status, Some(BusinessStatus::Scraped));
    assert!(failed.assistant_id.is_none());

    let working = pipeline(
        &db,
        Arc::new(FakeScraper::default()),
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeProvisioner::default()),
        5,
    );
    let retried = working.run_single("verkstad.se").await;

    assert!(retried.succeeded());
    assert_eq!(retried.business_id, failed.business_id);
    assert!(!retried.reused);
    // The slug claimed on the failed run is kept, not suffixed.
    assert_eq!(retried.slug.as_deref(), Some("verkstad"));

    let row = BusinessRepository::new(&db)
        .get(retried.business_id.unwrap())
        .await
        .unwrap();
    assert!(row.error_message.is_none());
}
