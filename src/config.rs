//! Optional config file loading. Search order: ./firecrawl.toml, then
//! $XDG_CONFIG_HOME/firecrawl/config.toml (or the platform config dir).

use crate::formats::Format;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// API key. FIRECRAWL_API_KEY and --api-key take precedence.
    pub api_key: Option<String>,
    /// Base URL for self-hosted instances.
    pub api_url: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Default formats when --format is not given, e.g. ["markdown", "links"].
    pub formats: Option<Vec<Format>>,
    pub only_main_content: Option<bool>,
}

/// Candidate config paths in search order.
pub fn config_paths() -> anyhow::Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let mut paths = vec![cwd.join("firecrawl.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("firecrawl").join("config.toml"));
    }
    Ok(paths)
}

/// Read one config file.
pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("Invalid config {}", path.display()))
}

/// First existing file from [`config_paths`]. Missing file returns Ok(None); a present but
/// unreadable or invalid file is an error.
pub fn load_config() -> anyhow::Result<Option<Config>> {
    for path in config_paths()? {
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}
