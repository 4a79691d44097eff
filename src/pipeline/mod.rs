//! Lead-to-demo pipeline
//!
//! Turns a website URL into a business with a hosted voice assistant:
//! scrape, extract, slug, assistant. Each URL is independent; a failed step
//! leaves the business in whatever status it reached and records the error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::RepositoryError;
use crate::integrations::ProviderError;
use crate::integrations::vapi::{AssistantSpec, infer_voice_provider};
use crate::models::business::{BusinessStatus, Model as Business};
use crate::repositories::{BusinessRepository, LeadEventRepository, lead_event};

pub mod prompt;
pub mod retry;
pub mod slug;
pub mod url;

use prompt::{ExtractedBusiness, assistant_first_message, assistant_system_prompt};
use retry::{RetryPolicy, retry_async};
use slug::unique_slug;
use self::url::normalize_url;

/// Upper bound on URLs accepted by one batch request.
pub const MAX_BATCH_URLS: usize = 100;

/// Attempts at claiming a slug when concurrent runs race for the same one.
const SLUG_CLAIM_ATTEMPTS: u32 = 3;

/// Scraped page content.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub markdown: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ProviderError>;
}

#[async_trait]
pub trait BusinessExtractor: Send + Sync {
    async fn extract(&self, url: &str, markdown: &str) -> Result<ExtractedBusiness, ProviderError>;
}

#[async_trait]
pub trait AssistantProvisioner: Send + Sync {
    /// Returns the provider's assistant id.
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub scrape_retry: RetryPolicy,
    pub default_voice_id: String,
    /// Server URL handed to every new assistant
    pub webhook_url: String,
    pub webhook_secret: Option<String>,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.pipeline.batch_size,
            batch_delay: Duration::from_millis(config.pipeline.batch_delay_ms),
            scrape_retry: RetryPolicy::new(
                config.pipeline.scrape_max_attempts,
                Duration::from_millis(config.pipeline.scrape_base_delay_ms),
            ),
            default_voice_id: config.default_voice_id.clone(),
            webhook_url: format!("{}/api/webhooks/vapi", config.public_base()),
            webhook_secret: config.vapi_webhook_secret.clone(),
        }
    }
}

/// Result for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PipelineOutcome {
    /// URL as submitted
    pub url: String,
    pub business_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<BusinessStatus>,
    pub assistant_id: Option<String>,
    /// True when an existing business with an assistant was returned as is
    pub reused: bool,
    pub error: Option<String>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    fn rejected(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            business_id: None,
            name: None,
            slug: None,
            status: None,
            assistant_id: None,
            reused: false,
            error: Some(error),
        }
    }

    fn from_business(url: &str, business: &Business, reused: bool, error: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            business_id: Some(business.id),
            name: business.name.clone(),
            slug: business.slug.clone(),
            status: Some(business.status),
            assistant_id: business.vapi_assistant_id.clone(),
            reused,
            error,
        }
    }
}

/// Results for a batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchOutcome {
    pub results: Vec<PipelineOutcome>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchOutcome {
    fn from_results(results: Vec<PipelineOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded()).count();
        Self {
            total: results.len(),
            failed: results.len() - succeeded,
            succeeded,
            results,
        }
    }
}

/// Failure of one step, with the step name for the lead event.
#[derive(Debug)]
struct StepError {
    step: &'static str,
    message: String,
}

impl StepError {
    fn new(step: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            step,
            message: err.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    db: DatabaseConnection,
    scraper: Arc<dyn Scraper>,
    extractor: Arc<dyn BusinessExtractor>,
    provisioner: Arc<dyn AssistantProvisioner>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        db: DatabaseConnection,
        scraper: Arc<dyn Scraper>,
        extractor: Arc<dyn BusinessExtractor>,
        provisioner: Arc<dyn AssistantProvisioner>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            db,
            scraper,
            extractor,
            provisioner,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Processes one URL end to end. Never fails; errors are reported in the outcome.
    pub async fn run_single(&self, input: &str) -> PipelineOutcome {
        let url = match normalize_url(input) {
            Ok(url) => url,
            Err(err) => {
                metrics::counter!("pipeline_runs_total", "outcome" => "invalid_url").increment(1);
                return PipelineOutcome::rejected(input, err.to_string());
            }
        };

        let businesses = BusinessRepository::new(&self.db);
        let existing = match businesses.find_by_website_url(&url).await {
            Ok(existing) => existing,
            Err(err) => return self.storage_failure(input, err),
        };

        let business = match existing {
            Some(business) if business.status.has_agent() && business.vapi_assistant_id.is_some() => {
                info!(business_id = %business.id, url = %url, "Reusing business with existing assistant");
                metrics::counter!("pipeline_runs_total", "outcome" => "reused").increment(1);
                return PipelineOutcome::from_business(input, &business, true, None);
            }
            Some(business) => business,
            None => match businesses.create_placeholder(&url).await {
                Ok(business) => business,
                Err(err) => return self.storage_failure(input, err),
            },
        };

        self.event(
            business.id,
            lead_event::PIPELINE_STARTED,
            json!({ "url": url, "previous_status": business.status }),
        )
        .await;

        match self.process(&business, &url).await {
            Ok(done) => {
                info!(
                    business_id = %done.id,
                    slug = done.slug.as_deref().unwrap_or_default(),
                    "Pipeline completed"
                );
                metrics::counter!("pipeline_runs_total", "outcome" => "succeeded").increment(1);
                PipelineOutcome::from_business(input, &done, false, None)
            }
            Err(err) => {
                warn!(business_id = %business.id, step = err.step, error = %err.message, "Pipeline step failed");
                metrics::counter!("pipeline_runs_total", "outcome" => "failed").increment(1);

                if let Err(db_err) = businesses.record_failure(business.id, &err.message).await {
                    warn!(business_id = %business.id, error = %db_err, "Failed to record pipeline failure");
                }
                self.event(
                    business.id,
                    lead_event::PIPELINE_FAILED,
                    json!({ "step": err.step, "error": err.message }),
                )
                .await;

                let latest = businesses
                    .find_by_id(business.id)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| business.clone());
                PipelineOutcome::from_business(input, &latest, false, Some(err.message))
            }
        }
    }

    /// Runs URLs in groups of `batch_size`, pausing `batch_delay` between groups.
    /// One result per input URL, in input order.
    pub async fn run_batch(&self, urls: &[String]) -> BatchOutcome {
        let mut results = Vec::with_capacity(urls.len());

        for (index, chunk) in urls.chunks(self.settings.batch_size.max(1)).enumerate() {
            if index > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
            results.extend(join_all(chunk.iter().map(|url| self.run_single(url))).await);
        }

        let outcome = BatchOutcome::from_results(results);
        info!(
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch pipeline finished"
        );
        outcome
    }

    async fn process(&self, business: &Business, url: &str) -> Result<Business, StepError> {
        let businesses = BusinessRepository::new(&self.db);

        let page = retry_async(&self.settings.scrape_retry, "scrape", |_| self.scraper.scrape(url))
            .await
            .map_err(|err| StepError::new("scrape", err))?;
        businesses
            .save_scrape(business.id, &page.markdown)
            .await
            .map_err(|err| StepError::new("scrape", err))?;
        self.event(
            business.id,
            lead_event::SCRAPED,
            json!({ "chars": page.markdown.chars().count(), "title": page.title }),
        )
        .await;

        let extracted = self
            .extractor
            .extract(url, &page.markdown)
            .await
            .map_err(|err| StepError::new("extract", err))?;
        businesses
            .save_extraction(business.id, &extracted)
            .await
            .map_err(|err| StepError::new("extract", err))?;
        self.event(
            business.id,
            lead_event::EXTRACTED,
            json!({ "name": extracted.name, "services": extracted.services.len() }),
        )
        .await;

        let slug = self.claim_slug(&businesses, business.id, &extracted.name).await?;

        let voice_id = business
            .voice_id
            .clone()
            .unwrap_or_else(|| self.settings.default_voice_id.clone());
        let spec = AssistantSpec {
            name: extracted.name.clone(),
            first_message: assistant_first_message(&extracted),
            system_prompt: assistant_system_prompt(&extracted),
            voice_provider: infer_voice_provider(&voice_id).to_string(),
            voice_id: voice_id.clone(),
            server_url: self.settings.webhook_url.clone(),
            server_secret: self.settings.webhook_secret.clone(),
            language: "sv".to_string(),
        };
        let assistant_id = self
            .provisioner
            .create_assistant(&spec)
            .await
            .map_err(|err| StepError::new("assistant", err))?;

        let done = businesses
            .mark_agent_created(business.id, &slug, &assistant_id, &voice_id)
            .await
            .map_err(|err| StepError::new("assistant", err))?;
        self.event(
            business.id,
            lead_event::AGENT_CREATED,
            json!({ "assistant_id": assistant_id, "slug": slug }),
        )
        .await;

        Ok(done)
    }

    /// Picks the first free slug and stores it. Retries when a concurrent run
    /// claims the same slug between the check and the write.
    async fn claim_slug(
        &self,
        businesses: &BusinessRepository<'_>,
        business_id: Uuid,
        name: &str,
    ) -> Result<String, StepError> {
        let mut attempt = 1;
        loop {
            let slug = unique_slug(name, |candidate| async move {
                businesses.slug_taken(&candidate, business_id).await
            })
            .await
            .map_err(|err| StepError::new("slug", err))?;

            match businesses.reserve_slug(business_id, &slug).await {
                Ok(_) => return Ok(slug),
                Err(RepositoryError::Conflict(_)) if attempt < SLUG_CLAIM_ATTEMPTS => attempt += 1,
                Err(err) => return Err(StepError::new("slug", err)),
            }
        }
    }

    fn storage_failure(&self, input: &str, err: RepositoryError) -> PipelineOutcome {
        warn!(url = %input, error = %err, "Pipeline could not access storage");
        metrics::counter!("pipeline_runs_total", "outcome" => "failed").increment(1);
        PipelineOutcome::rejected(input, err.to_string())
    }

    /// Lead events are an audit trail; a failed write must not fail the run.
    async fn event(&self, business_id: Uuid, event_type: &str, metadata: serde_json::Value) {
        if let Err(err) = LeadEventRepository::new(&self.db)
            .append(business_id, event_type, metadata)
            .await
        {
            warn!(%business_id, event_type, error = %err, "Failed to append lead event");
        }
    }
}
