//! Two-level sitemap resolution: index → leaf sitemaps → page URLs
//!
//! Documents are decoded with `quick-xml`'s serde support into typed
//! structures whose repeated children are `Vec`s, so a leaf with a single
//! `<url>` has exactly the same shape as one with many. Entries need not be
//! contiguous: other elements between them are skipped.

use quick_xml::de::from_str;
use quick_xml::errors::serialize::DeError;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::archive::fetch::ContentFetcher;
use crate::error::{Error, Result};

/// A `<sitemap>` or `<url>` entry; only the location is kept
#[derive(Debug, Default, Deserialize)]
struct Location {
    #[serde(default)]
    loc: String,
}

/// `<sitemapindex>` document
#[derive(Debug, Default, Deserialize)]
struct SitemapIndex {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<Location>,
}

/// `<urlset>` document
#[derive(Debug, Default, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<Location>,
}

fn locations(entries: Vec<Location>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Decode a sitemap index into leaf sitemap URLs, in document order
pub fn parse_sitemap_index(xml: &str) -> std::result::Result<Vec<String>, DeError> {
    let index: SitemapIndex = from_str(xml)?;
    Ok(locations(index.sitemaps))
}

/// Decode a leaf sitemap into page URLs, in document order
pub fn parse_urlset(xml: &str) -> std::result::Result<Vec<String>, DeError> {
    let urlset: UrlSet = from_str(xml)?;
    Ok(locations(urlset.urls))
}

/// Resolves sitemap documents through a content fetcher
pub struct SitemapResolver<'a, F: ContentFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: ContentFetcher + ?Sized> SitemapResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Fetch the sitemap index at `url` and list its leaf sitemaps
    ///
    /// A document that does not decode as a sitemap index yields no leaves.
    /// Fetch failures are returned.
    #[instrument(skip(self))]
    pub async fn resolve_index(&self, url: &str) -> Result<Vec<String>> {
        let xml = self.fetcher.fetch(url).await?;
        match parse_sitemap_index(&xml) {
            Ok(leaves) => {
                info!("Found {} sitemap files in {}", leaves.len(), url);
                Ok(leaves)
            }
            Err(e) => {
                warn!("Sitemap index {} is malformed, no sitemaps found: {}", url, e);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch the leaf sitemap at `url` and list its page URLs
    #[instrument(skip(self))]
    pub async fn resolve_leaf(&self, url: &str) -> Result<Vec<String>> {
        let xml = self.fetcher.fetch(url).await?;
        let pages = parse_urlset(&xml).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })?;
        info!("Found {} URLs in {}", pages.len(), url);
        Ok(pages)
    }
}
