//! Firecrawl v2 client: option normalization, transport, error classification, and response mapping.

mod error;
mod http;
mod options;
mod response;

pub use error::{ErrorKind, FirecrawlError, Result};
pub use http::{ApiResponse, HttpClient, HttpClientBuilder, DEFAULT_API_URL};
pub use options::{
    prepare_scrape_payload, validate_scrape_options, Location, ProxyMode, ScrapeOptions,
};
pub use response::{handle_response_error, map_data, map_scrape_response};

use crate::model::ScrapeResult;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const SCRAPE_PATH: &str = "/v2/scrape";
const CREDIT_USAGE_PATH: &str = "/v2/team/credit-usage";

/// Remaining credits for the team owning the API key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditUsage {
    pub remaining_credits: i64,
    #[serde(default)]
    pub plan_credits: Option<i64>,
    #[serde(default)]
    pub billing_period_start: Option<String>,
    #[serde(default)]
    pub billing_period_end: Option<String>,
}

/// Client for the Firecrawl API. Immutable once built; share it freely across threads.
#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    http: HttpClient,
}

impl FirecrawlClient {
    /// Client against the hosted API with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> FirecrawlClientBuilder {
        FirecrawlClientBuilder {
            http: HttpClient::builder(api_key),
        }
    }

    pub fn api_url(&self) -> &str {
        self.http.api_url()
    }

    /// Scrape one URL. Options are validated before anything is sent.
    pub fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapeResult> {
        let payload = prepare_scrape_payload(url, options)?;
        debug!(
            "scraping {} with formats [{}]",
            url,
            options
                .formats
                .iter()
                .map(|f| f.kind().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let response = self.http.post_json(
            SCRAPE_PATH,
            &Value::Object(payload),
            options.timeout.map(Duration::from_millis),
        )?;
        map_scrape_response(&response)
    }

    /// Current credit balance.
    pub fn credit_usage(&self) -> Result<CreditUsage> {
        let response = self.http.get(CREDIT_USAGE_PATH)?;
        map_data(&response, "get credit usage")
    }
}

/// Builder for FirecrawlClient. Configuration is explicit; nothing is read from the environment.
#[derive(Debug)]
pub struct FirecrawlClientBuilder {
    http: HttpClientBuilder,
}

impl FirecrawlClientBuilder {
    /// Override the API base URL. Default https://api.firecrawl.dev.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.api_url(url);
        self
    }

    /// Request timeout in seconds. Default 60.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.http = self.http.timeout_secs(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http = self.http.user_agent(ua);
        self
    }

    pub fn build(self) -> Result<FirecrawlClient> {
        Ok(FirecrawlClient {
            http: self.http.build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn client_is_shareable_across_threads() {
        assert_send_sync::<FirecrawlClient>();
    }

    #[test]
    fn builder_passes_api_url_through() -> Result<()> {
        let client = FirecrawlClient::builder("fc-test")
            .api_url("http://localhost:3002/")
            .timeout_secs(5)
            .build()?;
        assert_eq!(client.api_url(), "http://localhost:3002");
        Ok(())
    }

    #[test]
    fn invalid_options_fail_without_network() -> Result<()> {
        // Port 9 (discard) is never contacted: validation fails first.
        let client = FirecrawlClient::builder("fc-test")
            .api_url("http://127.0.0.1:9")
            .build()?;
        let options = ScrapeOptions {
            timeout: Some(0),
            ..Default::default()
        };
        let err = client.scrape("https://example.com", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOption);
        Ok(())
    }
}
