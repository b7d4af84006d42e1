//! Typed view over the `data` object of a successful scrape.
//!
//! Field names follow the API's camelCase on the wire and snake_case in Rust.
//! Which fields are present depends on the formats requested.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Index;

/// One scraped page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Untouched page HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Screenshot URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Extracted data for a `json` format; matches its schema when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_tracking: Option<ChangeTracking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Page metadata. Only the commonly used keys are typed; everything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "sourceURL", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `changeTracking` block, kept exactly as the API sent it.
///
/// Index it by wire key (`ct["changeStatus"]`); missing keys index to `Value::Null`.
/// The accessors below read the well-known keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeTracking(pub Map<String, Value>);

static NULL: Value = Value::Null;

impl Index<&str> for ChangeTracking {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    New,
    Same,
    Changed,
    Removed,
}

impl ChangeStatus {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ChangeStatus::New),
            "same" => Some(ChangeStatus::Same),
            "changed" => Some(ChangeStatus::Changed),
            "removed" => Some(ChangeStatus::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl ChangeTracking {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// ISO-8601 timestamp of the scrape this one was compared against; absent on first scrape.
    pub fn previous_scrape_at(&self) -> Option<&str> {
        self.0.get("previousScrapeAt").and_then(Value::as_str)
    }

    /// Parsed `changeStatus`; `None` when absent or not a known value.
    pub fn change_status(&self) -> Option<ChangeStatus> {
        self.0
            .get("changeStatus")
            .and_then(Value::as_str)
            .and_then(ChangeStatus::from_wire)
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self.0.get("visibility").and_then(Value::as_str) {
            Some("visible") => Some(Visibility::Visible),
            Some("hidden") => Some(Visibility::Hidden),
            _ => None,
        }
    }

    /// Unified diff text (git-diff mode).
    pub fn diff_text(&self) -> Option<&str> {
        self.0
            .get("diff")
            .and_then(|d| d.get("text"))
            .and_then(Value::as_str)
    }

    /// Structured diff (git-diff mode).
    pub fn diff_json(&self) -> Option<&Value> {
        self.0.get("diff").and_then(|d| d.get("json"))
    }

    /// Per-field previous/current values (json mode).
    pub fn json(&self) -> Option<&Value> {
        self.0.get("json")
    }
}
