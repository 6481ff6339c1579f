//! Core data models for normalized search results.

mod record;
mod search;

pub use record::{Authors, ResultRecord, Year, NO_DOI, NO_URL, UNKNOWN};
pub use search::{FailureKind, SearchOutcome, SearchQuery};
