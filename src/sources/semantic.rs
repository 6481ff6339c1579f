//! Semantic Scholar research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::{Authors, ResultRecord, SearchQuery, Year, NO_URL, UNKNOWN};
use crate::sources::{Source, SourceError};
use crate::utils::{with_retry, HttpClient, RetryPolicy, Sleeper, TokioSleeper};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

const SEARCH_FIELDS: &str = "title,authors,year,url";

/// Semantic Scholar research source
///
/// The public API is aggressively rate limited, so every request is preceded
/// by a fixed pause and HTTP 429 responses are retried under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: HttpClient,
    base_url: String,
    request_delay: Duration,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl SemanticScholarSource {
    /// Create a new Semantic Scholar source
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: SEMANTIC_API_BASE.to_string(),
            request_delay: Duration::from_secs(2),
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn from_config(client: HttpClient, config: &Config) -> Self {
        Self::new(client)
            .base_url(config.endpoints.semantic.clone())
            .request_delay(Duration::from_millis(config.semantic.request_delay_ms))
            .retry_policy(RetryPolicy::from(&config.retry))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Parse Semantic Scholar paper data
    fn parse_paper(data: S2Paper) -> ResultRecord {
        let authors = match data.authors {
            Some(authors) => Authors::Names(
                authors
                    .into_iter()
                    .map(|a| a.name.unwrap_or_else(|| UNKNOWN.to_string()))
                    .collect(),
            ),
            None => Authors::Unknown,
        };

        ResultRecord::new(data.title.unwrap_or_else(|| UNKNOWN.to_string()))
            .authors(authors)
            .year(data.year.map(Year::Number).unwrap_or(Year::Unknown))
            .link(data.url.unwrap_or_else(|| NO_URL.to_string()))
    }

    async fn fetch_once(&self, url: &str) -> Result<S2SearchResponse, SourceError> {
        self.sleeper.sleep(self.request_delay).await;

        tracing::debug!(url = %url, "Searching Semantic Scholar");

        let response = self.client.get(url).send().await.map_err(|e| {
            SourceError::Network(format!("Failed to search Semantic Scholar: {}", e))
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Semantic Scholar rate limit hit");
            }
            return Err(SourceError::from_status(status));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, SourceError> {
        let url = format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            SEARCH_FIELDS
        );

        let data = with_retry(&self.retry, self.sleeper.as_ref(), || self.fetch_once(&url)).await?;

        let records: Vec<ResultRecord> = data
            .data
            .into_iter()
            .map(Self::parse_paper)
            .collect();

        tracing::debug!(count = records.len(), "Semantic Scholar results parsed");
        Ok(records)
    }
}

// ===== Semantic Scholar API Types =====

#[derive(Debug, Deserialize)]
struct S2Paper {
    title: Option<String>,
    year: Option<i64>,
    authors: Option<Vec<S2Author>>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingSleeper;
    use serde_json::json;

    fn test_source(url: String, sleeper: Arc<RecordingSleeper>) -> SemanticScholarSource {
        SemanticScholarSource::new(HttpClient::new().unwrap())
            .base_url(url)
            .request_delay(Duration::from_millis(2))
            .retry_policy(
                RetryPolicy::default()
                    .max_attempts(3)
                    .initial_delay(Duration::from_millis(5)),
            )
            .sleeper(sleeper)
    }

    fn body() -> String {
        json!({
            "total": 2,
            "offset": 0,
            "data": [
                {
                    "paperId": "abc",
                    "title": "LLM Honeypots",
                    "authors": [{"authorId": "1", "name": "Ada Lovelace"}, {"authorId": "2", "name": "Alan Turing"}],
                    "year": 2024,
                    "url": "https://www.semanticscholar.org/paper/abc"
                },
                {"paperId": "def", "title": "Untitled draft"}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_paper_missing_fields() {
        let record = SemanticScholarSource::parse_paper(
            serde_json::from_value(json!({"paperId": "x"})).unwrap(),
        );

        assert_eq!(record.title, "Unknown");
        assert_eq!(record.authors, Authors::Unknown);
        assert_eq!(record.year, Year::Unknown);
        assert_eq!(record.link, "No URL");
        assert_eq!(record.doi, None);
    }

    #[tokio::test]
    async fn test_search_parses_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("query".into(), "genai".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "2".into()),
                mockito::Matcher::UrlEncoded("fields".into(), "title,authors,year,url".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body())
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = test_source(server.url(), Arc::clone(&sleeper));
        let records = source
            .search(&SearchQuery::new("genai").max_results(2))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].authors,
            Authors::Names(vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()])
        );
        assert_eq!(records[0].year, Year::Number(2024));
        assert_eq!(records[1].link, "No URL");
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(2)]);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body())
            .expect(1)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = test_source(server.url(), Arc::clone(&sleeper));
        let records = source.search(&SearchQuery::new("genai")).await.unwrap();

        limited.assert_async().await;
        ok.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "LLM Honeypots");

        // pre-request pause, one retry delay, pre-request pause again
        let slept = sleeper.recorded();
        assert_eq!(
            slept,
            vec![
                Duration::from_millis(2),
                Duration::from_millis(5),
                Duration::from_millis(2)
            ]
        );
        assert_eq!(
            slept.iter().filter(|d| **d == Duration::from_millis(5)).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_attempts() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = test_source(server.url(), Arc::clone(&sleeper));
        let err = source.search(&SearchQuery::new("genai")).await.unwrap_err();

        limited.assert_async().await;
        assert!(matches!(err, SourceError::RateLimit));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_other_status_is_terminal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = test_source(server.url(), Arc::clone(&sleeper));
        let err = source.search(&SearchQuery::new("genai")).await.unwrap_err();

        mock.assert_async().await;
        assert!(!err.is_transient());
        assert!(err.to_string().contains("500"));
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(2)]);
    }

    #[tokio::test]
    async fn test_no_content_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(mockito::Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = test_source(server.url(), sleeper);
        let err = source.search(&SearchQuery::new("genai")).await.unwrap_err();

        assert!(matches!(err, SourceError::Status(204)));
        assert!(!err.is_transient());
    }
}
