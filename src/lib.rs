//! firecrawl: blocking client and CLI for the Firecrawl v2 scrape API.
//!
//! ```no_run
//! use firecrawl::{FirecrawlClient, FormatKind, ScrapeOptions};
//!
//! let client = FirecrawlClient::new("fc-your-key")?;
//! let options = ScrapeOptions::with_formats([FormatKind::Markdown, FormatKind::ChangeTracking]);
//! let result = client.scrape("https://example.com", &options)?;
//! if let Some(ct) = &result.change_tracking {
//!     println!("{}", ct["changeStatus"]);
//! }
//! # Ok::<(), firecrawl::FirecrawlError>(())
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod formats;
pub mod model;

// Re-exports for CLI and consumers.
pub use client::{
    prepare_scrape_payload, validate_scrape_options, CreditUsage, ErrorKind, FirecrawlClient,
    FirecrawlClientBuilder, FirecrawlError, Location, ProxyMode, Result, ScrapeOptions,
};
pub use formats::{
    ChangeTrackingFormat, ChangeTrackingMode, Format, FormatKind, JsonFormat, ScreenshotFormat,
    Viewport,
};
pub use model::{ChangeStatus, ChangeTracking, DocumentMetadata, ScrapeResult, Visibility};
