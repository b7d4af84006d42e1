//! Scrape options and their normalization into the request payload.

use super::error::{FirecrawlError, Result};
use crate::formats::{Format, FormatKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// Proxy tier the service should fetch through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    Basic,
    Stealth,
    Auto,
}

impl ProxyMode {
    pub const ALL: [ProxyMode; 3] = [ProxyMode::Basic, ProxyMode::Stealth, ProxyMode::Auto];

    pub fn as_str(self) -> &'static str {
        match self {
            ProxyMode::Basic => "basic",
            ProxyMode::Stealth => "stealth",
            ProxyMode::Auto => "auto",
        }
    }
}

impl FromStr for ProxyMode {
    type Err = FirecrawlError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        ProxyMode::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| {
                FirecrawlError::invalid_option(format!(
                    "unknown proxy '{}'. Use basic, stealth, or auto.",
                    s
                ))
            })
    }
}

/// Geolocation hint for the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

/// Options for one scrape. Every field is optional; unset fields are left out of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions {
    /// Requested outputs, in order. Empty means the server default (markdown).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_main_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_tags: Option<Vec<String>>,
    /// Extra headers the service sends to the target site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Milliseconds to wait after load before capturing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<u64>,
    /// Server-side timeout in milliseconds. Must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tls_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_base64_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_ads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyMode>,
    /// Accept a cached copy up to this many milliseconds old.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_in_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsers: Option<Vec<String>>,
}

impl ScrapeOptions {
    /// Options requesting exactly these formats.
    pub fn with_formats<I, F>(formats: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Format>,
    {
        ScrapeOptions {
            formats: formats.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Build from loosely-typed format entries (strings or descriptor objects), validating each.
    pub fn from_format_values(values: &[Value]) -> Result<Self> {
        let formats = values
            .iter()
            .map(Format::parse_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(ScrapeOptions {
            formats,
            ..Default::default()
        })
    }

    pub fn requests(&self, kind: FormatKind) -> bool {
        self.formats.iter().any(|f| f.kind() == kind)
    }
}

/// Check every option without building a payload.
pub fn validate_scrape_options(options: &ScrapeOptions) -> Result<()> {
    let mut seen = HashSet::new();
    for format in &options.formats {
        format.validate()?;
        if !seen.insert(format.kind()) {
            return Err(FirecrawlError::invalid_option(format!(
                "format '{}' requested more than once",
                format.kind()
            )));
        }
    }
    if options.timeout == Some(0) {
        return Err(FirecrawlError::invalid_option("timeout must be positive"));
    }
    if let (Some(wait), Some(timeout)) = (options.wait_for, options.timeout) {
        if wait >= timeout {
            return Err(FirecrawlError::invalid_option(format!(
                "waitFor ({} ms) must be less than timeout ({} ms)",
                wait, timeout
            )));
        }
    }
    if let Some(headers) = &options.headers {
        if headers.keys().any(|k| k.trim().is_empty()) {
            return Err(FirecrawlError::invalid_option("header names must not be empty"));
        }
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(FirecrawlError::invalid_option("url must not be empty"));
    }
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| FirecrawlError::invalid_option(format!("invalid url '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FirecrawlError::invalid_option(format!(
            "url must use http or https, got '{}'",
            other
        ))),
    }
}

/// Validate and turn `url` + `options` into the JSON body for `POST /v2/scrape`.
pub fn prepare_scrape_payload(url: &str, options: &ScrapeOptions) -> Result<Map<String, Value>> {
    validate_url(url)?;
    validate_scrape_options(options)?;

    let encoded = serde_json::to_value(options)
        .map_err(|e| FirecrawlError::invalid_option(format!("cannot encode options: {}", e)))?;
    let Value::Object(mut payload) = encoded else {
        return Err(FirecrawlError::invalid_option(
            "scrape options did not encode to a JSON object",
        ));
    };
    payload.insert("url".into(), Value::String(url.trim().to_string()));
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{ChangeTrackingFormat, ChangeTrackingMode};
    use serde_json::json;

    #[test]
    fn formats_keep_order_and_identity() -> Result<()> {
        let options = ScrapeOptions::from_format_values(&[
            json!("markdown"),
            json!({"type": "changeTracking", "modes": ["git-diff", "json"], "schema": {"type": "object"}}),
            json!("links"),
        ])?;
        let payload = prepare_scrape_payload("https://example.com", &options)?;
        assert_eq!(payload["url"], "https://example.com");
        assert_eq!(
            payload["formats"],
            json!([
                "markdown",
                {"type": "changeTracking", "modes": ["git-diff", "json"], "schema": {"type": "object"}},
                "links",
            ])
        );
        Ok(())
    }

    #[test]
    fn plain_formats_serialize_as_strings() -> Result<()> {
        let options =
            ScrapeOptions::with_formats([FormatKind::Markdown, FormatKind::ChangeTracking]);
        assert!(options.requests(FormatKind::ChangeTracking));
        assert!(!options.requests(FormatKind::Html));
        let payload = prepare_scrape_payload("https://example.com", &options)?;
        assert_eq!(payload["formats"], json!(["markdown", "changeTracking"]));
        Ok(())
    }

    #[test]
    fn typed_change_tracking_descriptor() -> Result<()> {
        let options = ScrapeOptions::with_formats([
            Format::Plain(FormatKind::Markdown),
            Format::ChangeTracking(ChangeTrackingFormat {
                modes: Some(vec![ChangeTrackingMode::GitDiff]),
                tag: Some("daily".into()),
                ..Default::default()
            }),
        ]);
        let payload = prepare_scrape_payload("https://example.com", &options)?;
        assert_eq!(
            payload["formats"][1],
            json!({"type": "changeTracking", "modes": ["git-diff"], "tag": "daily"})
        );
        Ok(())
    }

    #[test]
    fn empty_formats_are_omitted() -> Result<()> {
        let payload = prepare_scrape_payload("https://example.com", &ScrapeOptions::default())?;
        assert!(!payload.contains_key("formats"));
        assert_eq!(payload.len(), 1);
        Ok(())
    }

    #[test]
    fn flags_use_wire_names() -> Result<()> {
        let options = ScrapeOptions {
            only_main_content: Some(true),
            exclude_tags: Some(vec!["nav".into()]),
            wait_for: Some(500),
            timeout: Some(30_000),
            proxy: Some(ProxyMode::Stealth),
            max_age: Some(0),
            location: Some(Location {
                country: Some("DE".into()),
                languages: None,
            }),
            skip_tls_verification: Some(false),
            remove_base64_images: Some(true),
            store_in_cache: Some(false),
            headers: Some(BTreeMap::from([("X-Test".to_string(), "1".to_string())])),
            ..Default::default()
        };
        let payload = prepare_scrape_payload("https://example.com", &options)?;
        assert_eq!(payload["onlyMainContent"], true);
        assert_eq!(payload["excludeTags"], json!(["nav"]));
        assert_eq!(payload["waitFor"], 500);
        assert_eq!(payload["timeout"], 30_000);
        assert_eq!(payload["proxy"], "stealth");
        assert_eq!(payload["maxAge"], 0);
        assert_eq!(payload["location"], json!({"country": "DE"}));
        assert_eq!(payload["skipTlsVerification"], false);
        assert_eq!(payload["removeBase64Images"], true);
        assert_eq!(payload["storeInCache"], false);
        assert_eq!(payload["headers"], json!({"X-Test": "1"}));
        assert!(!payload.contains_key("mobile"));
        assert!(!payload.contains_key("formats"));
        assert!(!payload.contains_key("only_main_content"));
        Ok(())
    }

    #[test]
    fn proxy_parses_case_insensitively() -> Result<()> {
        assert_eq!("Stealth".parse::<ProxyMode>()?, ProxyMode::Stealth);
        assert_eq!(" auto ".parse::<ProxyMode>()?, ProxyMode::Auto);
        assert!("premium".parse::<ProxyMode>().is_err());
        Ok(())
    }

    #[test]
    fn duplicate_format_is_rejected() {
        let options = ScrapeOptions::with_formats([FormatKind::Markdown, FormatKind::Markdown]);
        let err = validate_scrape_options(&options).unwrap_err();
        assert!(err.message().contains("more than once"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let options = ScrapeOptions {
            timeout: Some(0),
            ..Default::default()
        };
        assert!(validate_scrape_options(&options).is_err());
    }

    #[test]
    fn wait_for_must_fit_in_timeout() {
        let options = ScrapeOptions {
            wait_for: Some(5_000),
            timeout: Some(5_000),
            ..Default::default()
        };
        assert!(validate_scrape_options(&options).is_err());
    }

    #[test]
    fn bad_urls_are_rejected() {
        let options = ScrapeOptions::default();
        assert!(prepare_scrape_payload("", &options).is_err());
        assert!(prepare_scrape_payload("example.com", &options).is_err());
        assert!(prepare_scrape_payload("ftp://example.com", &options).is_err());
    }

    #[test]
    fn unknown_format_value_fails_before_payload() {
        let err = ScrapeOptions::from_format_values(&[json!("markdown"), json!("pdf")]).unwrap_err();
        assert!(matches!(err, FirecrawlError::InvalidOption { .. }));
    }
}
