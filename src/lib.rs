//! # lit-sweep
//!
//! Sweeps a list of keywords across academic search sources and prints the
//! normalized results.
//!
//! ## Architecture
//!
//! - [`models`]: the normalized [`ResultRecord`] and the tagged [`SearchOutcome`]
//! - [`sources`]: the [`Source`] trait and the Google Scholar, CrossRef and
//!   Semantic Scholar adapters
//! - [`sweep`]: the driver that walks keywords and sources in order
//! - [`utils`]: HTTP client and bounded retry helpers
//! - [`config`]: layered configuration (defaults, TOML file, environment)

pub mod config;
pub mod models;
pub mod sources;
pub mod sweep;
pub mod utils;

// Re-export commonly used types
pub use models::{ResultRecord, SearchOutcome};
pub use sources::{Source, SourceRegistry};
pub use sweep::{OutputFormat, Sweep};
