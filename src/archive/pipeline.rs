//! Archive pipeline: resolve the sitemap hierarchy, then route, fetch,
//! sanitize and persist every in-scope page
//!
//! Leaf sitemaps are drained one at a time in document order. Within a leaf,
//! up to `concurrency` page fetches may be in flight, but results are
//! consumed in document order and persisted one page at a time, HTML before
//! PDF.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::archive::fetch::{with_query, ContentFetcher};
use crate::archive::filename::derive_filename;
use crate::archive::layout::StorageLayout;
use crate::archive::render::DocumentRenderer;
use crate::archive::router::{CatalogRouter, Route};
use crate::archive::sanitize::MarkupSanitizer;
use crate::archive::sitemap::SitemapResolver;
use crate::archive::ArchivedPage;
use crate::config::{ArchiveConfig, FetchFailurePolicy};
use crate::error::{Error, Result};

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Leaf sitemaps listed by the index
    pub leaf_sitemaps: usize,
    /// Page URLs listed by all resolved leaf sitemaps
    pub pages_found: usize,
    /// Pages whose HTML was written
    pub archived: usize,
    /// Pages matching no catalog rule
    pub skipped: usize,
    /// Pages or leaf sitemaps that could not be fetched (skip policy only)
    pub fetch_failures: usize,
    /// Pages whose PDF could not be rendered
    pub render_failures: usize,
}

/// Progress events emitted while a run is in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveProgress {
    /// A leaf sitemap was resolved into `pages` URLs
    LeafResolved { sitemap: String, pages: usize },
    /// A page was written
    PageArchived { url: String },
    /// A page matched no catalog rule
    PageSkipped { url: String },
    /// A page could not be fetched and was skipped
    PageFailed { url: String },
}

/// A resolved page URL with its routing decision, for dry runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPage {
    pub url: String,
    /// Target bucket, `None` when the page is out of scope
    pub bucket: Option<String>,
    pub filename: String,
}

/// Drives a full archive run against a fetcher and a renderer
pub struct ArchivePipeline<'a, F, R> {
    config: &'a ArchiveConfig,
    fetcher: F,
    renderer: R,
    router: CatalogRouter,
    sanitizer: MarkupSanitizer,
    layout: StorageLayout,
    progress: Option<mpsc::Sender<ArchiveProgress>>,
}

impl<'a, F, R> ArchivePipeline<'a, F, R>
where
    F: ContentFetcher,
    R: DocumentRenderer,
{
    /// Build a pipeline, compiling routing and sanitizing rules up front
    pub fn new(config: &'a ArchiveConfig, fetcher: F, renderer: R) -> Result<Self> {
        Ok(Self {
            config,
            fetcher,
            renderer,
            router: CatalogRouter::new(config.filter_and_catalog.as_ref())?,
            sanitizer: MarkupSanitizer::new(&config.strip_tags, &config.strip_content)?,
            layout: StorageLayout::from_config(config),
            progress: None,
        })
    }

    /// Report progress events on `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<ArchiveProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    async fn notify(&self, event: ArchiveProgress) {
        if let Some(sender) = &self.progress {
            // A dropped receiver only loses progress output
            let _ = sender.send(event).await;
        }
    }

    fn skip_fetch_failures(&self, err: &Error) -> bool {
        self.config.on_fetch_error == FetchFailurePolicy::Skip && err.is_fetch()
    }

    /// Run the whole archive
    #[instrument(skip(self), fields(sitemap = %self.config.sitemap_url))]
    pub async fn run(&self) -> Result<ArchiveSummary> {
        self.layout.ensure().await?;

        let resolver = SitemapResolver::new(&self.fetcher);
        info!("Fetching main sitemap {}", self.config.sitemap_url);
        let leaves = resolver.resolve_index(&self.config.sitemap_url).await?;
        info!("Building site crawl list from {} files", leaves.len());

        let mut summary = ArchiveSummary {
            leaf_sitemaps: leaves.len(),
            ..Default::default()
        };

        for leaf in &leaves {
            let pages = match resolver.resolve_leaf(leaf).await {
                Ok(pages) => pages,
                Err(e) if self.skip_fetch_failures(&e) => {
                    error!("Skipping sitemap {}: {}", leaf, e);
                    summary.fetch_failures += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            summary.pages_found += pages.len();
            self.notify(ArchiveProgress::LeafResolved {
                sitemap: leaf.clone(),
                pages: pages.len(),
            })
            .await;

            self.archive_leaf(&pages, &mut summary).await?;
        }

        info!(
            archived = summary.archived,
            skipped = summary.skipped,
            fetch_failures = summary.fetch_failures,
            render_failures = summary.render_failures,
            "Archived {} of {} pages",
            summary.archived,
            summary.pages_found
        );
        Ok(summary)
    }

    async fn archive_leaf(&self, pages: &[String], summary: &mut ArchiveSummary) -> Result<()> {
        let mut targets = Vec::with_capacity(pages.len());
        for url in pages {
            match self.router.route(url) {
                Route::Archive { bucket } => targets.push((url.as_str(), bucket)),
                Route::Skip => {
                    debug!("Skipping {}: no catalog rule matches", url);
                    summary.skipped += 1;
                    self.notify(ArchiveProgress::PageSkipped { url: url.clone() })
                        .await;
                }
            }
        }

        info!("Fetching and saving {} URLs", targets.len());

        let params = self.config.fetch_url_params.as_deref();
        let mut fetched = stream::iter(targets)
            .map(|(url, bucket)| async move {
                let result = self.fetcher.fetch(&with_query(url, params)).await;
                (url, bucket, result)
            })
            .buffered(self.config.concurrency.max(1));

        while let Some((url, bucket, result)) = fetched.next().await {
            let body = match result {
                Ok(body) => body,
                Err(e) if self.skip_fetch_failures(&e) => {
                    error!("Skipping page {}: {}", url, e);
                    summary.fetch_failures += 1;
                    self.notify(ArchiveProgress::PageFailed {
                        url: url.to_string(),
                    })
                    .await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let page = self.prepare(url, bucket, &body);
            self.persist(&page, summary).await?;
            self.notify(ArchiveProgress::PageArchived {
                url: url.to_string(),
            })
            .await;
        }

        Ok(())
    }

    /// Sanitize a fetched body and derive its file name
    pub fn prepare(&self, url: &str, bucket: &str, body: &str) -> ArchivedPage {
        ArchivedPage {
            url: url.to_string(),
            html: self.sanitizer.sanitize(body),
            filename: derive_filename(&self.config.sitemap_host, url),
            bucket: bucket.to_string(),
        }
    }

    /// Write the HTML file, then render the PDF; render failures are counted
    /// and logged but do not fail the page
    async fn persist(&self, page: &ArchivedPage, summary: &mut ArchiveSummary) -> Result<()> {
        let html_path = self.layout.html_path(&page.bucket, &page.filename);
        debug!("Writing {}", html_path.display());
        fs::write(&html_path, &page.html).await?;
        summary.archived += 1;

        if self.config.render_pdf {
            let pdf_path = self.layout.pdf_path(&page.bucket, &page.filename);
            if let Err(e) = self.renderer.render(&page.html, &pdf_path).await {
                error!("Failed to render PDF for {}: {}", page.url, e);
                summary.render_failures += 1;
            }
        }

        Ok(())
    }

    /// Resolve every page URL and its route without fetching pages or
    /// writing anything
    #[instrument(skip(self), fields(sitemap = %self.config.sitemap_url))]
    pub async fn plan(&self) -> Result<Vec<PlannedPage>> {
        let resolver = SitemapResolver::new(&self.fetcher);
        let leaves = resolver.resolve_index(&self.config.sitemap_url).await?;

        let mut planned = Vec::new();
        for leaf in &leaves {
            let pages = match resolver.resolve_leaf(leaf).await {
                Ok(pages) => pages,
                Err(e) if self.skip_fetch_failures(&e) => {
                    error!("Skipping sitemap {}: {}", leaf, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            planned.extend(pages.into_iter().map(|url| {
                let bucket = self.router.route(&url).bucket().map(String::from);
                let filename = derive_filename(&self.config.sitemap_host, &url);
                PlannedPage {
                    url,
                    bucket,
                    filename,
                }
            }));
        }

        Ok(planned)
    }
}
