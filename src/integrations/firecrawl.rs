//! Firecrawl scrape API client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ProviderError, send_json, trim_base};
use crate::pipeline::{ScrapedPage, Scraper};

const PROVIDER: &str = "firecrawl";

pub struct FirecrawlClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    #[serde(default)]
    metadata: ScrapeMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeMetadata {
    title: Option<String>,
    description: Option<String>,
}

impl FirecrawlClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            api_key,
        }
    }

    /// Scrapes the main content of `url` as markdown.
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let request = self
            .http
            .post(format!("{}/v1/scrape", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "url": url,
                "formats": ["markdown"],
                "onlyMainContent": true,
            }));

        let response: ScrapeResponse = send_json(PROVIDER, request).await?;
        if !response.success {
            return Err(ProviderError::decode(
                PROVIDER,
                response
                    .error
                    .unwrap_or_else(|| "scrape reported no success".to_string()),
            ));
        }

        let data = response
            .data
            .ok_or_else(|| ProviderError::decode(PROVIDER, "response has no data"))?;
        let markdown = data
            .markdown
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ProviderError::decode(PROVIDER, "page has no markdown content"))?;

        Ok(ScrapedPage {
            markdown,
            title: data.metadata.title,
            description: data.metadata.description,
        })
    }
}

#[async_trait]
impl Scraper for FirecrawlClient {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ProviderError> {
        FirecrawlClient::scrape(self, url).await
    }
}
