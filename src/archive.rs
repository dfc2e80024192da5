//! # Site Archive Module
//!
//! This module turns a root sitemap URL into a catalog-organized archive of
//! cleaned HTML and PDF snapshots.
//!
//! ## Key Components
//!
//! - `SitemapResolver`: Resolves a sitemap index into leaf sitemaps and a leaf
//!   sitemap into page URLs
//! - `CatalogRouter`: Assigns each page URL to a bucket, or skips it
//! - `MarkupSanitizer`: Strips configured tag blocks and literal fragments
//! - `derive_filename`: Maps a page URL to the base name of its files
//! - `StorageLayout`: Creates the output tree and computes destinations
//! - `ArchivePipeline`: Drives the whole run
//!
//! ## Collaborators
//!
//! Network access and PDF rendering sit behind the `ContentFetcher` and
//! `DocumentRenderer` traits. `HttpFetcher` and `WkhtmltopdfRenderer` are the
//! production implementations; tests substitute in-memory ones.

mod fetch;
mod filename;
mod layout;
mod pipeline;
mod render;
mod router;
mod sanitize;
mod sitemap;

pub use fetch::{with_query, ContentFetcher, HttpFetcher};
pub use filename::{derive_filename, INDEX_FILENAME};
pub use layout::StorageLayout;
pub use pipeline::{ArchivePipeline, ArchiveProgress, ArchiveSummary, PlannedPage};
pub use render::{DocumentRenderer, WkhtmltopdfRenderer};
pub use router::{CatalogRouter, Route};
pub use sanitize::MarkupSanitizer;
pub use sitemap::{parse_sitemap_index, parse_urlset, SitemapResolver};

use serde::Serialize;

/// A fetched, sanitized page ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedPage {
    /// URL listed in the sitemap
    pub url: String,

    /// Sanitized HTML
    pub html: String,

    /// Base name shared by the HTML and PDF files
    pub filename: String,

    /// Target bucket, empty for the root bucket
    pub bucket: String,
}
