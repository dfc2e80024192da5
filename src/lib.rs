//! # sitearchive - Sitemap-driven website archiver
//!
//! This crate archives a website's public content by walking its sitemap
//! hierarchy, fetching every listed page, sanitizing the markup, routing it
//! into a catalog of subdirectories, persisting the cleaned HTML and
//! rendering a PDF snapshot of each page.
//!
//! ## Features
//!
//! - Two-level sitemap resolution (index → leaf sitemaps → page URLs)
//! - Ordered, first-match catalog routing with regular expressions
//! - Tag-block and literal-fragment sanitization
//! - Eager, idempotent creation of the output tree
//! - Optional bounded fetch concurrency with order-preserving persistence
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitearchive::archive::{ArchivePipeline, HttpFetcher, WkhtmltopdfRenderer};
//! use sitearchive::config::ArchiveConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArchiveConfig::load("archive.json").await?;
//!     let fetcher = HttpFetcher::new(&config)?;
//!     let renderer = WkhtmltopdfRenderer::new(&config.renderer);
//!
//!     let summary = ArchivePipeline::new(&config, fetcher, renderer)?.run().await?;
//!     println!("Archived {} pages", summary.archived);
//!     Ok(())
//! }
//! ```

mod error;

pub mod archive;
pub mod config;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
