//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{ResultRecord, SearchQuery};
use crate::sources::{Source, SourceError};

/// A mock source for testing that returns predefined responses.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    name: String,
    response: Mutex<Option<Result<Vec<ResultRecord>, String>>>,
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source with no configured response.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            response: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these records from every search.
    pub fn with_records(self, records: Vec<ResultRecord>) -> Self {
        self.set_records(records);
        self
    }

    /// Fail every search with a terminal error carrying this message.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.response.lock() {
            *guard = Some(Err(message.into()));
        }
        self
    }

    /// Set the records to return.
    pub fn set_records(&self, records: Vec<ResultRecord>) {
        if let Ok(mut guard) = self.response.lock() {
            *guard = Some(Ok(records));
        }
    }

    /// Number of searches received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query strings received, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.query.clone());
        }

        let guard = self
            .response
            .lock()
            .map_err(|_| SourceError::Other("mock response lock poisoned".to_string()))?;
        match &*guard {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(message)) => Err(SourceError::Other(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(title: &str) -> ResultRecord {
    ResultRecord::new(title).link(format!("http://example.com/{}", title.replace(' ', "-")))
}
