//! Error types for the sitearchive crate

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for archive operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, unreadable, malformed or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection-level HTTP failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Malformed sitemap XML
    #[error("Decode error for {url}: {source}")]
    Decode {
        /// URL of the document that failed to decode
        url: String,
        /// Underlying deserializer error
        #[source]
        source: quick_xml::errors::serialize::DeError,
    },

    /// PDF rendering failure
    #[error("Render error: {0}")]
    Render(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from fetching a URL
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Status { .. })
    }
}
