//! Requested output formats: plain tags (`"markdown"`) and structured descriptors
//! (`{"type": "changeTracking", "modes": [...]}`). Each variant is validated before it reaches the wire.

use crate::client::{FirecrawlError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Known format tags, as the API names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Markdown,
    Html,
    RawHtml,
    Links,
    Images,
    Screenshot,
    Summary,
    ChangeTracking,
    Json,
    Attributes,
}

impl FormatKind {
    pub const ALL: [FormatKind; 10] = [
        FormatKind::Markdown,
        FormatKind::Html,
        FormatKind::RawHtml,
        FormatKind::Links,
        FormatKind::Images,
        FormatKind::Screenshot,
        FormatKind::Summary,
        FormatKind::ChangeTracking,
        FormatKind::Json,
        FormatKind::Attributes,
    ];

    /// Wire name (camelCase).
    pub fn as_str(self) -> &'static str {
        match self {
            FormatKind::Markdown => "markdown",
            FormatKind::Html => "html",
            FormatKind::RawHtml => "rawHtml",
            FormatKind::Links => "links",
            FormatKind::Images => "images",
            FormatKind::Screenshot => "screenshot",
            FormatKind::Summary => "summary",
            FormatKind::ChangeTracking => "changeTracking",
            FormatKind::Json => "json",
            FormatKind::Attributes => "attributes",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatKind {
    type Err = FirecrawlError;

    /// Accepts the camelCase wire name and the snake_case spelling (`raw_html`, `change_tracking`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(kind) = FormatKind::ALL.iter().find(|k| k.as_str() == s) {
            return Ok(*kind);
        }
        match s {
            "raw_html" => Ok(FormatKind::RawHtml),
            "change_tracking" => Ok(FormatKind::ChangeTracking),
            _ => Err(FirecrawlError::invalid_option(format!(
                "unknown format '{}'. Expected one of: {}",
                s,
                FormatKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Change-tracking comparison modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTrackingMode {
    GitDiff,
    Json,
}

impl ChangeTrackingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeTrackingMode::GitDiff => "git-diff",
            ChangeTrackingMode::Json => "json",
        }
    }
}

impl FromStr for ChangeTrackingMode {
    type Err = FirecrawlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "git-diff" => Ok(ChangeTrackingMode::GitDiff),
            "json" => Ok(ChangeTrackingMode::Json),
            other => Err(FirecrawlError::invalid_option(format!(
                "unknown changeTracking mode '{}'. Use git-diff or json.",
                other
            ))),
        }
    }
}

/// `{"type": "changeTracking", ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTrackingFormat {
    /// `None` leaves `modes` out of the request; `Some(vec![])` sends an empty list.
    pub modes: Option<Vec<ChangeTrackingMode>>,
    /// JSON schema for the `json` mode. Sent unchanged.
    pub schema: Option<Value>,
    pub prompt: Option<String>,
    /// Separates change-tracking histories of the same URL.
    pub tag: Option<String>,
}

/// `{"type": "json", ...}`. Needs a schema, a prompt, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonFormat {
    pub schema: Option<Value>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// `{"type": "screenshot", ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenshotFormat {
    pub full_page: Option<bool>,
    /// JPEG quality, 1..=100.
    pub quality: Option<u8>,
    pub viewport: Option<Viewport>,
}

/// One entry of the `formats` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    Plain(FormatKind),
    ChangeTracking(ChangeTrackingFormat),
    Json(JsonFormat),
    Screenshot(ScreenshotFormat),
}

impl From<FormatKind> for Format {
    fn from(kind: FormatKind) -> Self {
        Format::Plain(kind)
    }
}

impl From<ChangeTrackingFormat> for Format {
    fn from(f: ChangeTrackingFormat) -> Self {
        Format::ChangeTracking(f)
    }
}

impl From<JsonFormat> for Format {
    fn from(f: JsonFormat) -> Self {
        Format::Json(f)
    }
}

impl From<ScreenshotFormat> for Format {
    fn from(f: ScreenshotFormat) -> Self {
        Format::Screenshot(f)
    }
}

impl Format {
    /// The tag this entry stands for; structured descriptors report their `type`.
    pub fn kind(&self) -> FormatKind {
        match self {
            Format::Plain(kind) => *kind,
            Format::ChangeTracking(_) => FormatKind::ChangeTracking,
            Format::Json(_) => FormatKind::Json,
            Format::Screenshot(_) => FormatKind::Screenshot,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Format::Plain(FormatKind::Json) => Err(FirecrawlError::invalid_option(
                "the json format needs a schema or prompt; pass it as {\"type\": \"json\", ...}",
            )),
            Format::Plain(_) | Format::ChangeTracking(_) => Ok(()),
            Format::Json(f) => {
                if f.schema.is_none() && f.prompt.is_none() {
                    return Err(FirecrawlError::invalid_option(
                        "the json format needs a schema or a prompt",
                    ));
                }
                Ok(())
            }
            Format::Screenshot(f) => match f.quality {
                Some(q) if !(1..=100).contains(&q) => Err(FirecrawlError::invalid_option(
                    format!("screenshot quality must be between 1 and 100, got {}", q),
                )),
                _ => Ok(()),
            },
        }
    }

    /// Canonical wire form: a string for plain tags, an object with `type` for descriptors.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        match self {
            Format::Plain(kind) => return Value::String(kind.as_str().to_string()),
            Format::ChangeTracking(f) => {
                if let Some(modes) = &f.modes {
                    obj.insert(
                        "modes".into(),
                        Value::Array(
                            modes
                                .iter()
                                .map(|m| Value::String(m.as_str().to_string()))
                                .collect(),
                        ),
                    );
                }
                insert_opt(&mut obj, "schema", f.schema.clone());
                insert_opt(&mut obj, "prompt", f.prompt.clone().map(Value::String));
                insert_opt(&mut obj, "tag", f.tag.clone().map(Value::String));
            }
            Format::Json(f) => {
                insert_opt(&mut obj, "schema", f.schema.clone());
                insert_opt(&mut obj, "prompt", f.prompt.clone().map(Value::String));
            }
            Format::Screenshot(f) => {
                insert_opt(&mut obj, "fullPage", f.full_page.map(Value::Bool));
                insert_opt(&mut obj, "quality", f.quality.map(Value::from));
                if let Some(vp) = f.viewport {
                    obj.insert(
                        "viewport".into(),
                        serde_json::json!({ "width": vp.width, "height": vp.height }),
                    );
                }
            }
        }
        obj.insert("type".into(), Value::String(self.kind().as_str().to_string()));
        Value::Object(obj)
    }

    /// Parse a loosely-typed entry (string tag or descriptor object) and validate it.
    pub fn parse_value(value: &Value) -> Result<Format> {
        let format = match value {
            Value::String(s) => Format::Plain(s.parse()?),
            Value::Object(obj) => parse_descriptor(obj)?,
            other => {
                return Err(FirecrawlError::invalid_option(format!(
                    "format entries must be strings or objects, got {}",
                    other
                )))
            }
        };
        format.validate()?;
        Ok(format)
    }
}

fn insert_opt(obj: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        obj.insert(key.to_string(), v);
    }
}

fn parse_descriptor(obj: &Map<String, Value>) -> Result<Format> {
    let type_name = match obj.get("type") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(FirecrawlError::invalid_option(format!(
                "format 'type' must be a string, got {}",
                other
            )))
        }
        None => {
            return Err(FirecrawlError::invalid_option(
                "format object is missing required 'type' field",
            ))
        }
    };
    let kind: FormatKind = type_name.parse()?;
    match kind {
        FormatKind::ChangeTracking => {
            reject_unknown_keys(obj, kind, &["modes", "schema", "prompt", "tag"])?;
            let modes = match obj.get("modes") {
                None | Some(Value::Null) => None,
                Some(Value::Array(items)) => Some(
                    items
                        .iter()
                        .map(|m| match m {
                            Value::String(s) => s.parse(),
                            other => Err(FirecrawlError::invalid_option(format!(
                                "changeTracking modes must be strings, got {}",
                                other
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()?,
                ),
                Some(other) => {
                    return Err(FirecrawlError::invalid_option(format!(
                        "changeTracking modes must be a list, got {}",
                        other
                    )))
                }
            };
            Ok(Format::ChangeTracking(ChangeTrackingFormat {
                modes,
                schema: opt_schema(obj)?,
                prompt: opt_string(obj, kind, "prompt")?,
                tag: opt_string(obj, kind, "tag")?,
            }))
        }
        FormatKind::Json => {
            reject_unknown_keys(obj, kind, &["schema", "prompt"])?;
            Ok(Format::Json(JsonFormat {
                schema: opt_schema(obj)?,
                prompt: opt_string(obj, kind, "prompt")?,
            }))
        }
        FormatKind::Screenshot => {
            reject_unknown_keys(obj, kind, &["fullPage", "quality", "viewport"])?;
            let full_page = match obj.get("fullPage") {
                None | Some(Value::Null) => None,
                Some(Value::Bool(b)) => Some(*b),
                Some(other) => {
                    return Err(FirecrawlError::invalid_option(format!(
                        "screenshot fullPage must be a boolean, got {}",
                        other
                    )))
                }
            };
            let quality = match obj.get("quality") {
                None | Some(Value::Null) => None,
                Some(v) => Some(
                    v.as_u64()
                        .and_then(|q| u8::try_from(q).ok())
                        .ok_or_else(|| {
                            FirecrawlError::invalid_option(format!(
                                "screenshot quality must be between 1 and 100, got {}",
                                v
                            ))
                        })?,
                ),
            };
            let viewport = match obj.get("viewport") {
                None | Some(Value::Null) => None,
                Some(v) => {
                    let dim = |key: &str| {
                        v.get(key)
                            .and_then(Value::as_u64)
                            .and_then(|n| u32::try_from(n).ok())
                            .ok_or_else(|| {
                                FirecrawlError::invalid_option(format!(
                                    "screenshot viewport needs a numeric '{}'",
                                    key
                                ))
                            })
                    };
                    Some(Viewport {
                        width: dim("width")?,
                        height: dim("height")?,
                    })
                }
            };
            Ok(Format::Screenshot(ScreenshotFormat {
                full_page,
                quality,
                viewport,
            }))
        }
        plain => {
            reject_unknown_keys(obj, plain, &[])?;
            Ok(Format::Plain(plain))
        }
    }
}

fn reject_unknown_keys(obj: &Map<String, Value>, kind: FormatKind, allowed: &[&str]) -> Result<()> {
    match obj
        .keys()
        .find(|k| k.as_str() != "type" && !allowed.contains(&k.as_str()))
    {
        Some(key) => Err(FirecrawlError::invalid_option(format!(
            "unexpected field '{}' on {} format",
            key, kind
        ))),
        None => Ok(()),
    }
}

fn opt_schema(obj: &Map<String, Value>) -> Result<Option<Value>> {
    match obj.get("schema") {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Object(_)) => Ok(Some(v.clone())),
        Some(other) => Err(FirecrawlError::invalid_option(format!(
            "schema must be a JSON object, got {}",
            other
        ))),
    }
}

fn opt_string(obj: &Map<String, Value>, kind: FormatKind, key: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(FirecrawlError::invalid_option(format!(
            "{} {} must be a string, got {}",
            kind, key, other
        ))),
    }
}

impl Serialize for Format {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Format::parse_value(&value).map_err(|e| serde::de::Error::custom(e.message()))
    }
}
