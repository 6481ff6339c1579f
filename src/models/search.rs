//! Search request and outcome models.

use serde::Serialize;

use super::ResultRecord;
use crate::sources::SourceError;

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Maximum number of results to return
    pub max_results: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: 100,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// Whether a failed search is worth trying again later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transient,
    Terminal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Terminal => write!(f, "terminal"),
        }
    }
}

/// Outcome of one source call for one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchOutcome {
    Success { records: Vec<ResultRecord> },
    Failure { kind: FailureKind, message: String },
}

impl SearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }

    /// Records on success, `None` on failure
    pub fn records(&self) -> Option<&[ResultRecord]> {
        match self {
            SearchOutcome::Success { records } => Some(records),
            SearchOutcome::Failure { .. } => None,
        }
    }
}

impl From<Result<Vec<ResultRecord>, SourceError>> for SearchOutcome {
    fn from(result: Result<Vec<ResultRecord>, SourceError>) -> Self {
        match result {
            Ok(records) => SearchOutcome::Success { records },
            Err(err) => SearchOutcome::Failure {
                kind: if err.is_transient() {
                    FailureKind::Transient
                } else {
                    FailureKind::Terminal
                },
                message: err.to_string(),
            },
        }
    }
}
