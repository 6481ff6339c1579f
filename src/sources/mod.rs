//! Search source adapters.
//!
//! Every upstream service implements the [`Source`] trait: it takes a
//! [`SearchQuery`] and returns normalized [`ResultRecord`]s, or a
//! [`SourceError`] describing why it could not.
//!
//! Three sources ship with the crate and are registered in this order:
//!
//! - `google_scholar` - Google Scholar result pages, parsed from HTML
//! - `crossref` - the CrossRef `/works` REST API
//! - `semantic` - the Semantic Scholar graph API, retried when rate limited
//!
//! Sources can be selected at runtime through the `[sources]` section of the
//! configuration or the `--source` flag; see [`SourceRegistry::from_config`].

mod crossref;
mod google_scholar;
mod registry;
mod semantic;

pub mod mock;

pub use crossref::CrossRefSource;
pub use google_scholar::GoogleScholarSource;
pub use mock::MockSource;
pub use registry::SourceRegistry;
pub use semantic::SemanticScholarSource;

use crate::models::{ResultRecord, SearchQuery};
use async_trait::async_trait;

/// The Source trait defines the interface for all search source adapters.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in configuration, e.g. "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this source, used in section headers
    fn name(&self) -> &str;

    /// Search for papers matching the query
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (JSON, HTML)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded (status 429)")]
    RateLimit,

    /// Any other unsuccessful HTTP status
    #[error("API returned status {0}")]
    Status(u16),

    /// The source served a captcha or bot-detection page
    #[error("Blocked by source: {0}")]
    Blocked(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl SourceError {
    /// Whether trying the same request again later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::RateLimit | SourceError::Network(_))
    }

    /// Map a non-success HTTP status to an error
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            SourceError::RateLimit
        } else {
            SourceError::Status(status.as_u16())
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::RateLimit.is_transient());
        assert!(SourceError::Network("connection reset".to_string()).is_transient());
        assert!(!SourceError::Status(500).is_transient());
        assert!(!SourceError::Parse("bad json".to_string()).is_transient());
        assert!(!SourceError::Blocked("captcha".to_string()).is_transient());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            SourceError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            SourceError::RateLimit
        ));
        let err = SourceError::from_status(reqwest::StatusCode::FORBIDDEN);
        assert!(matches!(err, SourceError::Status(403)));
        assert!(err.to_string().contains("403"));
    }
}
