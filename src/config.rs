//! # Archive Configuration Module
//!
//! This module provides the configuration for an archive run: where the
//! sitemap lives, where output goes, how fetched markup is cleaned and how
//! page URLs are routed into catalog buckets.
//!
//! ## Key Components
//!
//! - `ArchiveConfig`: The immutable run configuration, loaded once at startup
//! - `ArchiveConfigBuilder`: Builder pattern implementation for library use
//! - `Catalog`: Ordered bucket → URL pattern rules
//!
//! ## Loading
//!
//! The configuration is a JSON document with camelCase keys. The binary reads
//! its path from `--config` or the `CONFIG_FILE` environment variable. Every
//! loaded configuration is validated before any work begins, so an invalid
//! bucket name or pattern never reaches the pipeline.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding the configuration file path
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// What to do when a page or leaf sitemap cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Stop the run with the fetch error
    #[default]
    Abort,
    /// Log the failure, count it and move on
    Skip,
}

/// A single catalog rule: URLs matching `pattern` go into `bucket`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRule {
    /// Output subdirectory name
    pub bucket: String,

    /// Regular expression searched anywhere in the URL
    pub pattern: String,
}

/// Catalog rules in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog(Vec<CatalogRule>);

impl Catalog {
    /// Rules in declaration order
    pub fn rules(&self) -> &[CatalogRule] {
        &self.0
    }

    /// Bucket names in declaration order
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|rule| rule.bucket.as_str())
    }
}

impl<B, P> FromIterator<(B, P)> for Catalog
where
    B: Into<String>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (B, P)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(bucket, pattern)| CatalogRule {
                    bucket: bucket.into(),
                    pattern: pattern.into(),
                })
                .collect(),
        )
    }
}

// A JSON object decodes in document order, which is the rule precedence.
impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of bucket names to URL patterns")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Catalog, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((bucket, pattern)) = map.next_entry::<String, String>()? {
                    rules.push(CatalogRule { bucket, pattern });
                }
                Ok(Catalog(rules))
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// External PDF renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Executable to run
    pub command: String,

    /// Arguments passed before the input and output operands
    pub args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".to_string(),
            args: vec!["--quiet".to_string()],
        }
    }
}

/// Configuration for an archive run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveConfig {
    /// Site origin stripped from page URLs when deriving file names
    pub sitemap_host: String,

    /// Root sitemap index URL
    pub sitemap_url: String,

    /// Output root directory
    pub save_dir_root: PathBuf,

    /// Query string appended to every page fetch
    #[serde(default)]
    pub fetch_url_params: Option<String>,

    /// Tags whose whole element is removed from fetched HTML
    #[serde(default)]
    pub strip_tags: Vec<String>,

    /// Literal fragments removed from fetched HTML
    #[serde(default)]
    pub strip_content: Vec<String>,

    /// Bucket routing rules; absent means everything goes to the root bucket
    #[serde(default)]
    pub filter_and_catalog: Option<Catalog>,

    /// Maximum page fetches in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Behaviour on page or leaf sitemap fetch failure
    #[serde(default)]
    pub on_fetch_error: FetchFailurePolicy,

    /// Per-request timeout; no timeout when absent
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// PDF renderer settings
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Whether to render PDF snapshots at all
    #[serde(default = "default_render_pdf")]
    pub render_pdf: bool,
}

fn default_concurrency() -> usize {
    1
}

fn default_user_agent() -> String {
    format!("sitearchive/{}", env!("CARGO_PKG_VERSION"))
}

fn default_render_pdf() -> bool {
    true
}

impl ArchiveConfig {
    /// Create a new builder
    pub fn builder(
        sitemap_host: impl Into<String>,
        sitemap_url: impl Into<String>,
        save_dir_root: impl Into<PathBuf>,
    ) -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::new(sitemap_host, sitemap_url, save_dir_root)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Load the configuration named by the `CONFIG_FILE` environment variable
    pub async fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_FILE_ENV)
            .ok_or_else(|| Error::Config(format!("{} is not set", CONFIG_FILE_ENV)))?;
        Self::load(PathBuf::from(path)).await
    }

    /// Check the invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.sitemap_url)
            .map_err(|e| Error::Config(format!("sitemapUrl '{}': {}", self.sitemap_url, e)))?;

        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }

        if let Some(tag) = self.strip_tags.iter().find(|tag| tag.trim().is_empty()) {
            return Err(Error::Config(format!("invalid stripTags entry '{}'", tag)));
        }

        if let Some(catalog) = &self.filter_and_catalog {
            let mut seen = HashSet::new();
            for rule in catalog.rules() {
                if !is_directory_name(&rule.bucket) {
                    return Err(Error::Config(format!(
                        "bucket '{}' is not a valid directory name",
                        rule.bucket
                    )));
                }
                if !seen.insert(rule.bucket.as_str()) {
                    return Err(Error::Config(format!("duplicate bucket '{}'", rule.bucket)));
                }
                regex::Regex::new(&rule.pattern).map_err(|e| {
                    Error::Config(format!("pattern for bucket '{}': {}", rule.bucket, e))
                })?;
            }
        }

        Ok(())
    }

    /// Configured bucket names, empty when no catalog is configured
    pub fn buckets(&self) -> Vec<&str> {
        self.filter_and_catalog
            .as_ref()
            .map(|catalog| catalog.buckets().collect())
            .unwrap_or_default()
    }
}

fn is_directory_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Builder for ArchiveConfig
#[derive(Debug)]
pub struct ArchiveConfigBuilder {
    config: ArchiveConfig,
}

impl ArchiveConfigBuilder {
    /// Create a new builder with default options
    pub fn new(
        sitemap_host: impl Into<String>,
        sitemap_url: impl Into<String>,
        save_dir_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config: ArchiveConfig {
                sitemap_host: sitemap_host.into(),
                sitemap_url: sitemap_url.into(),
                save_dir_root: save_dir_root.into(),
                fetch_url_params: None,
                strip_tags: Vec::new(),
                strip_content: Vec::new(),
                filter_and_catalog: None,
                concurrency: default_concurrency(),
                on_fetch_error: FetchFailurePolicy::default(),
                request_timeout_secs: None,
                user_agent: default_user_agent(),
                renderer: RendererConfig::default(),
                render_pdf: default_render_pdf(),
            },
        }
    }

    /// Set the query string appended to page fetches
    pub fn fetch_url_params(mut self, params: impl Into<String>) -> Self {
        self.config.fetch_url_params = Some(params.into());
        self
    }

    /// Set the tags to strip
    pub fn strip_tags(mut self, tags: Vec<String>) -> Self {
        self.config.strip_tags = tags;
        self
    }

    /// Set the literal fragments to strip
    pub fn strip_content(mut self, content: Vec<String>) -> Self {
        self.config.strip_content = content;
        self
    }

    /// Set the catalog rules
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.config.filter_and_catalog = Some(catalog);
        self
    }

    /// Set the number of page fetches in flight
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the fetch failure policy
    pub fn on_fetch_error(mut self, policy: FetchFailurePolicy) -> Self {
        self.config.on_fetch_error = policy;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the PDF renderer settings
    pub fn renderer(mut self, renderer: RendererConfig) -> Self {
        self.config.renderer = renderer;
        self
    }

    /// Enable or disable PDF rendering
    pub fn render_pdf(mut self, render_pdf: bool) -> Self {
        self.config.render_pdf = render_pdf;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ArchiveConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "sitemapHost": "https://example.com",
        "sitemapUrl": "https://example.com/sitemap.xml",
        "saveDirRoot": "/tmp/archive"
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = ArchiveConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.sitemap_host, "https://example.com");
        assert_eq!(config.save_dir_root, PathBuf::from("/tmp/archive"));
        assert!(config.fetch_url_params.is_none());
        assert!(config.strip_tags.is_empty());
        assert!(config.filter_and_catalog.is_none());
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.on_fetch_error, FetchFailurePolicy::Abort);
        assert!(config.render_pdf);
        assert_eq!(config.renderer.command, "wkhtmltopdf");
        assert!(config.buckets().is_empty());
    }

    #[test]
    fn test_catalog_keeps_declaration_order() {
        let json = r#"{
            "sitemapHost": "https://example.com",
            "sitemapUrl": "https://example.com/sitemap.xml",
            "saveDirRoot": "out",
            "filterAndCatalog": { "zeta": "/z/", "alpha": "/a/", "mid": "/m/" },
            "onFetchError": "skip",
            "stripTags": ["script", "style"]
        }"#;
        let config = ArchiveConfig::from_json(json).unwrap();
        assert_eq!(config.buckets(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(config.on_fetch_error, FetchFailurePolicy::Skip);
        assert_eq!(config.strip_tags, vec!["script", "style"]);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let json = r#"{
            "sitemapHost": "https://example.com",
            "sitemapUrl": "https://example.com/sitemap.xml",
            "saveDirRoot": "out",
            "filterAndCatalog": { "blog": "(unclosed" }
        }"#;
        assert!(matches!(ArchiveConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_bucket_names_rejected() {
        for bucket in ["", "..", "a/b"] {
            let result = ArchiveConfig::builder(
                "https://example.com",
                "https://example.com/sitemap.xml",
                "out",
            )
            .catalog([(bucket, "/x/")].into_iter().collect())
            .build();
            assert!(result.is_err(), "bucket {:?} should be rejected", bucket);
        }
    }

    #[test]
    fn test_missing_required_field() {
        let json = r#"{ "sitemapHost": "https://example.com" }"#;
        assert!(matches!(ArchiveConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_sitemap_url_and_concurrency() {
        let bad_url = ArchiveConfig::builder("https://example.com", "not a url", "out").build();
        assert!(bad_url.is_err());

        let zero = ArchiveConfig::builder(
            "https://example.com",
            "https://example.com/sitemap.xml",
            "out",
        )
        .concurrency(0)
        .build();
        assert!(zero.is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, MINIMAL).await.unwrap();

        let config = ArchiveConfig::load(&path).await.unwrap();
        assert_eq!(config.sitemap_url, "https://example.com/sitemap.xml");

        let missing = ArchiveConfig::load(dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
