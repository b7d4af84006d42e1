//! CLI parsing and orchestration. Resolves settings, runs one scrape, and writes markdown or JSON.
//! Maps errors to exit codes.

use crate::client::{ErrorKind, FirecrawlClient, FirecrawlError, ProxyMode, ScrapeOptions};
use crate::config::{self, Config};
use crate::formats::{ChangeTrackingFormat, ChangeTrackingMode, Format, FormatKind, JsonFormat};
use crate::model::ScrapeResult;
use clap::Parser;
use log::debug;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const API_KEY_ENV: &str = "FIRECRAWL_API_KEY";
const API_URL_ENV: &str = "FIRECRAWL_API_URL";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Firecrawl(#[from] FirecrawlError),

    #[error("Failed to write output: {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode result as JSON: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Firecrawl(e) if e.kind() == ErrorKind::InvalidOption => 1,
            CliRunError::Firecrawl(_) => 2,
            CliRunError::Output { .. } | CliRunError::Render(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "firecrawl", version)]
#[command(about = "Scrape a URL through the Firecrawl API and print markdown or JSON")]
#[command(
    after_help = "API key lookup: --api-key, then FIRECRAWL_API_KEY, then api_key in firecrawl.toml. Config file keys (api_key, api_url, timeout_secs, user_agent, formats, only_main_content) are documented in the README. CLI flags override config."
)]
pub struct Args {
    /// Page to scrape.
    #[arg(required_unless_present = "credits")]
    pub url: Option<String>,

    /// Output format to request (repeatable): markdown, html, rawHtml, links, images, screenshot, summary, changeTracking, json.
    #[arg(short, long = "format", value_parser = parse_format_kind)]
    pub formats: Vec<FormatKind>,

    /// Formats as a JSON array, e.g. '["markdown", {"type": "changeTracking", "modes": ["git-diff"]}]'. Replaces --format; descriptor flags still apply on top.
    #[arg(long, conflicts_with = "formats")]
    pub formats_json: Option<String>,

    /// Change-tracking modes, comma separated: git-diff, json. Implies --format changeTracking.
    #[arg(long, value_delimiter = ',', value_parser = parse_change_tracking_mode)]
    pub change_tracking_modes: Vec<ChangeTrackingMode>,

    /// JSON schema file for change tracking in json mode.
    #[arg(long)]
    pub change_tracking_schema: Option<PathBuf>,

    /// Tag separating change-tracking histories for the same URL.
    #[arg(long)]
    pub change_tracking_tag: Option<String>,

    /// Extraction prompt for the json format.
    #[arg(long)]
    pub json_prompt: Option<String>,

    /// JSON schema file for the json format.
    #[arg(long)]
    pub json_schema: Option<PathBuf>,

    /// Return only the main content of the page (drop headers, navs, footers).
    #[arg(long)]
    pub only_main_content: bool,

    /// Server-side scrape timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Milliseconds to wait after page load.
    #[arg(long)]
    pub wait_for_ms: Option<u64>,

    /// Emulate a mobile device.
    #[arg(long)]
    pub mobile: bool,

    /// Proxy tier: basic, stealth, or auto.
    #[arg(long, value_parser = parse_proxy)]
    pub proxy: Option<ProxyMode>,

    /// Accept a cached result up to this many milliseconds old.
    #[arg(long)]
    pub max_age_ms: Option<u64>,

    /// API key (overrides FIRECRAWL_API_KEY and config).
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL (overrides FIRECRAWL_API_URL and config).
    #[arg(long)]
    pub api_url: Option<String>,

    /// HTTP timeout in seconds (overrides config; default 60).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the whole result as JSON instead of markdown.
    #[arg(long)]
    pub json: bool,

    /// Print remaining credits and exit.
    #[arg(long)]
    pub credits: bool,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and full error chain.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_format_kind(s: &str) -> Result<FormatKind, String> {
    s.parse().map_err(|e: FirecrawlError| e.message())
}

fn parse_change_tracking_mode(s: &str) -> Result<ChangeTrackingMode, String> {
    s.parse().map_err(|e: FirecrawlError| e.message())
}

fn parse_proxy(s: &str) -> Result<ProxyMode, String> {
    s.parse().map_err(|e: FirecrawlError| e.message())
}

/// Connection settings after applying flag > environment > config file > default.
#[derive(Debug, PartialEq)]
struct Settings {
    api_key: String,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

fn resolve_settings(
    args: &Args,
    config: Option<&Config>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, CliRunError> {
    let non_empty = |s: String| if s.trim().is_empty() { None } else { Some(s) };
    let api_key = args
        .api_key
        .clone()
        .or_else(|| env(API_KEY_ENV).and_then(non_empty))
        .or_else(|| config.and_then(|c| c.api_key.clone()))
        .ok_or_else(|| {
            CliRunError::InvalidInput(format!(
                "No API key. Pass --api-key, set {}, or add api_key to firecrawl.toml.",
                API_KEY_ENV
            ))
        })?;
    let api_url = args
        .api_url
        .clone()
        .or_else(|| env(API_URL_ENV).and_then(non_empty))
        .or_else(|| config.and_then(|c| c.api_url.clone()));
    Ok(Settings {
        api_key,
        api_url,
        timeout_secs: args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)),
        user_agent: config.and_then(|c| c.user_agent.clone()),
    })
}

fn read_schema(path: &Path) -> Result<Value, CliRunError> {
    let s = std::fs::read_to_string(path).map_err(|e| {
        CliRunError::InvalidInput(format!("Cannot read schema {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&s).map_err(|e| {
        CliRunError::InvalidInput(format!("Invalid JSON in schema {}: {}", path.display(), e))
    })
}

/// Turn format flags into the formats list. Descriptor flags upgrade the entry of the same kind,
/// whether it came from --format, --formats-json, or the config file.
fn build_formats(args: &Args, config: Option<&Config>) -> Result<Vec<Format>, CliRunError> {
    let mut formats: Vec<Format> = if let Some(raw) = &args.formats_json {
        let values: Vec<Value> = serde_json::from_str(raw).map_err(|e| {
            CliRunError::InvalidInput(format!("Invalid --formats-json: {}", e))
        })?;
        ScrapeOptions::from_format_values(&values)?.formats
    } else if args.formats.is_empty() {
        config
            .and_then(|c| c.formats.clone())
            .unwrap_or_default()
    } else {
        args.formats.iter().copied().map(Format::Plain).collect()
    };

    let wants_change_tracking_descriptor = !args.change_tracking_modes.is_empty()
        || args.change_tracking_schema.is_some()
        || args.change_tracking_tag.is_some();
    if wants_change_tracking_descriptor {
        let descriptor = Format::ChangeTracking(ChangeTrackingFormat {
            modes: (!args.change_tracking_modes.is_empty())
                .then(|| args.change_tracking_modes.clone()),
            schema: args
                .change_tracking_schema
                .as_deref()
                .map(read_schema)
                .transpose()?,
            prompt: None,
            tag: args.change_tracking_tag.clone(),
        });
        upsert(&mut formats, descriptor);
    }

    if args.json_prompt.is_some() || args.json_schema.is_some() {
        let descriptor = Format::Json(JsonFormat {
            schema: args.json_schema.as_deref().map(read_schema).transpose()?,
            prompt: args.json_prompt.clone(),
        });
        upsert(&mut formats, descriptor);
    }
    Ok(formats)
}

/// Replace the entry of the same kind, or append.
fn upsert(formats: &mut Vec<Format>, format: Format) {
    match formats.iter_mut().find(|f| f.kind() == format.kind()) {
        Some(slot) => *slot = format,
        None => formats.push(format),
    }
}

fn build_options(args: &Args, config: Option<&Config>) -> Result<ScrapeOptions, CliRunError> {
    let only_main_content = if args.only_main_content {
        Some(true)
    } else {
        config.and_then(|c| c.only_main_content)
    };
    Ok(ScrapeOptions {
        formats: build_formats(args, config)?,
        only_main_content,
        timeout: args.timeout_ms,
        wait_for: args.wait_for_ms,
        mobile: args.mobile.then_some(true),
        proxy: args.proxy,
        max_age: args.max_age_ms,
        ..Default::default()
    })
}

/// Markdown when present and `--json` is off; the full result as JSON otherwise.
fn render_result(result: &ScrapeResult, as_json: bool) -> Result<String, CliRunError> {
    if !as_json {
        if let Some(md) = &result.markdown {
            return Ok(md.clone());
        }
    }
    Ok(serde_json::to_string_pretty(result)?)
}

fn change_summary(result: &ScrapeResult) -> Option<String> {
    let ct = result.change_tracking.as_ref()?;
    let status = ct["changeStatus"].as_str().unwrap_or("unknown");
    Some(match ct.previous_scrape_at() {
        Some(prev) => format!("Change status: {} (previous scrape {})", status, prev),
        None => format!("Change status: {}", status),
    })
}

fn write_output(text: &str, output: Option<&Path>) -> Result<(), CliRunError> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| CliRunError::Output {
            path: path.to_path_buf(),
            source: e,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).map_err(|e| CliRunError::Output {
                path: PathBuf::from("<stdout>"),
                source: e,
            })
        }
    }
}

fn spinner(message: String) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .template("{spinner} {msg} ({elapsed})")
    {
        bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(|e| CliRunError::InvalidInput(format!("{:#}", e)))?;
    let settings = resolve_settings(args, config.as_ref(), |k| std::env::var(k).ok())?;
    debug!(
        "api_url={} timeout_secs={:?}",
        settings.api_url.as_deref().unwrap_or(crate::client::DEFAULT_API_URL),
        settings.timeout_secs
    );

    let mut builder = FirecrawlClient::builder(settings.api_key);
    if let Some(url) = settings.api_url {
        builder = builder.api_url(url);
    }
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ua) = settings.user_agent {
        builder = builder.user_agent(ua);
    }
    let client = builder.build()?;

    if args.credits {
        let usage = client.credit_usage()?;
        return write_output(
            &format!("Remaining credits: {}", usage.remaining_credits),
            args.output.as_deref(),
        );
    }

    let url = args
        .url
        .as_deref()
        .ok_or_else(|| CliRunError::InvalidInput("A URL is required.".to_string()))?;
    let options = build_options(args, config.as_ref())?;

    let progress = (!args.quiet).then(|| spinner(format!("Scraping {}", url)));
    let outcome = client.scrape(url, &options);
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    let result = outcome?;

    if !args.quiet {
        if let Some(summary) = change_summary(&result) {
            eprintln!("{}", summary);
        }
        if let Some(warning) = &result.warning {
            eprintln!("Warning: {}", warning);
        }
    }

    write_output(&render_result(&result, args.json)?, args.output.as_deref())?;
    if let (Some(path), false) = (&args.output, args.quiet) {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
