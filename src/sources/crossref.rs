//! CrossRef research source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{Authors, ResultRecord, SearchQuery, Year, NO_DOI, UNKNOWN};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef research source
///
/// Issues a single `/works` query per search; no retry.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, CROSSREF_API_BASE)
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(client: HttpClient, config: &Config) -> Self {
        Self::with_base_url(client, config.endpoints.crossref.clone())
    }

    fn parse_item(item: CRItem) -> ResultRecord {
        let title = item
            .title
            .and_then(|titles| titles.into_iter().next())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let authors = match item.author {
            Some(authors) => Authors::Names(
                authors
                    .into_iter()
                    .map(|a| a.family.unwrap_or_else(|| UNKNOWN.to_string()))
                    .collect(),
            ),
            None => Authors::Unknown,
        };

        let year = item
            .published_print
            .and_then(|p| p.date_parts)
            .and_then(|parts| parts.into_iter().next())
            .and_then(|first| first.into_iter().next())
            .flatten()
            .map(Year::Number)
            .unwrap_or(Year::Absent);

        let link = format!("https://doi.org/{}", item.doi.as_deref().unwrap_or(""));
        let doi = item.doi.unwrap_or_else(|| NO_DOI.to_string());

        ResultRecord::new(title)
            .authors(authors)
            .year(year)
            .doi(doi)
            .link(link)
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, SourceError> {
        let url = format!(
            "{}/works?query={}&rows={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        tracing::debug!(url = %url, "Searching CrossRef");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search CrossRef: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(SourceError::from_status(response.status()));
        }

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        let records: Vec<ResultRecord> = data
            .message
            .items
            .into_iter()
            .map(Self::parse_item)
            .collect();

        tracing::debug!(count = records.len(), "CrossRef results parsed");
        Ok(records)
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    title: Option<Vec<String>>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    author: Option<Vec<CRAuthor>>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts")]
    date_parts: Option<Vec<Vec<Option<i64>>>>,
}
