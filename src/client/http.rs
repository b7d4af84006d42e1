//! Blocking HTTP transport: bearer auth, JSON bodies, one request per call, no retries.

use super::error::{FirecrawlError, Result};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.firecrawl.dev";
const DEFAULT_USER_AGENT: &str = concat!("firecrawl-rs/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Added on top of a per-request server timeout so the service can answer before we give up.
const TIMEOUT_HEADROOM: Duration = Duration::from_secs(5);

/// Status and body of one response, not yet interpreted.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, or `None` when it is not valid JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Holds the reqwest client and the immutable connection settings.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
    api_url: String,
}

impl HttpClient {
    pub fn builder(api_key: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(api_key)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// POST `body` as JSON to `path`. `timeout` overrides the client default for this request.
    pub fn post_json(
        &self,
        path: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse> {
        let url = self.url_for(path);
        debug!("POST {}", url);
        let mut request = self.inner.post(&url).json(body);
        if let Some(t) = timeout {
            request = request.timeout(t + TIMEOUT_HEADROOM);
        }
        let response = request.send().map_err(|e| FirecrawlError::Transport {
            url: url.clone(),
            source: e,
        })?;
        Self::read(url, response)
    }

    pub fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = self.url_for(path);
        debug!("GET {}", url);
        let response = self
            .inner
            .get(&url)
            .send()
            .map_err(|e| FirecrawlError::Transport {
                url: url.clone(),
                source: e,
            })?;
        Self::read(url, response)
    }

    fn read(url: String, response: reqwest::blocking::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| FirecrawlError::Transport { url: url.clone(), source: e })?;
        debug!("{} -> HTTP {} ({} bytes)", url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}

/// Builder for HttpClient: API key is required; base URL, timeout, and User-Agent are optional.
#[derive(Debug)]
pub struct HttpClientBuilder {
    api_key: String,
    api_url: Option<String>,
    timeout_secs: u64,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    /// Override the API base URL (self-hosted instances, tests). Default https://api.firecrawl.dev.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Default request timeout in seconds. Default 60.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(FirecrawlError::invalid_option("API key must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(FirecrawlError::invalid_option("timeout must be positive"));
        }
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            FirecrawlError::invalid_option("API key contains characters not allowed in a header")
        })?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_url = self
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if api_url.is_empty() {
            return Err(FirecrawlError::invalid_option("API URL must not be empty"));
        }

        let inner = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| FirecrawlError::ClientBuild { source: e })?;
        Ok(HttpClient { inner, api_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed_from_api_url() -> Result<()> {
        let client = HttpClient::builder("fc-key")
            .api_url("http://localhost:3002///")
            .build()?;
        assert_eq!(client.api_url(), "http://localhost:3002");
        assert_eq!(client.url_for("/v2/scrape"), "http://localhost:3002/v2/scrape");
        assert_eq!(client.url_for("v2/scrape"), "http://localhost:3002/v2/scrape");
        Ok(())
    }

    #[test]
    fn default_api_url() -> Result<()> {
        let client = HttpClient::builder("fc-key").build()?;
        assert_eq!(client.api_url(), DEFAULT_API_URL);
        Ok(())
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = HttpClient::builder("  ").build().unwrap_err();
        assert!(matches!(err, FirecrawlError::InvalidOption { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = HttpClient::builder("key").timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, FirecrawlError::InvalidOption { .. }));
        assert!(HttpClient::builder("key").timeout_secs(1).build().is_ok());
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        assert!(HttpClient::builder("abc\ndef").build().is_err());
    }

    #[test]
    fn api_response_success_range_and_json() {
        let ok = ApiResponse {
            status: 200,
            body: r#"{"success":true}"#.into(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.json(), Some(serde_json::json!({"success": true})));
        let bad = ApiResponse {
            status: 502,
            body: "<html>Bad Gateway</html>".into(),
        };
        assert!(!bad.is_success());
        assert!(bad.json().is_none());
    }
}
