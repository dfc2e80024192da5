//! Content retrieval for sitemaps and pages

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};

/// Retrieves the body of a URL as text
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url`, failing on connection errors and non-success statuses
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: ContentFetcher + ?Sized> ContentFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url).await
    }
}

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and timeout
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Sending GET request to {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Append a raw query string to `url`
pub fn with_query(url: &str, params: Option<&str>) -> String {
    match params.map(|p| p.trim_start_matches('?')) {
        Some(params) if !params.is_empty() => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", url, separator, params)
        }
        _ => url.to_string(),
    }
}
