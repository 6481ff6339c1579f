//! Keyword sweep driver.
//!
//! For every keyword, each source is called once, in registry order, and the
//! outcome is written out before the next call starts. A failing source never
//! stops the sweep; its failure is reported in place of its records.

use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

use crate::models::{SearchOutcome, SearchQuery};
use crate::sources::Source;

/// How the sweep reports its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Section headers with one pretty JSON block per record, written as results arrive
    #[default]
    Text,
    /// A single JSON document written once the sweep is complete
    Json,
}

/// Outcome of one source for one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepEntry {
    pub keyword: String,
    pub source: String,
    pub outcome: SearchOutcome,
}

/// Runs every keyword against every source, sequentially
#[derive(Debug, Clone)]
pub struct Sweep {
    sources: Vec<Arc<dyn Source>>,
    max_results: usize,
    format: OutputFormat,
}

impl Sweep {
    pub fn new(sources: &[Arc<dyn Source>]) -> Self {
        Self {
            sources: sources.to_vec(),
            max_results: SearchQuery::default().max_results,
            format: OutputFormat::default(),
        }
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Run the sweep, writing the report to `out`, and return every outcome
    pub async fn run<W: Write>(
        &self,
        keywords: &[String],
        out: &mut W,
    ) -> std::io::Result<Vec<SweepEntry>> {
        let mut entries = Vec::with_capacity(keywords.len() * self.sources.len());

        for keyword in keywords {
            tracing::info!(keyword = %keyword, "Sweeping keyword");
            let query = SearchQuery::new(keyword.as_str()).max_results(self.max_results);

            for source in &self.sources {
                if self.format == OutputFormat::Text {
                    write_header(out, source.name(), keyword)?;
                }

                let outcome = SearchOutcome::from(source.search(&query).await);
                match &outcome {
                    SearchOutcome::Success { records } => tracing::info!(
                        source = source.id(),
                        count = records.len(),
                        "Source returned results"
                    ),
                    SearchOutcome::Failure { kind, message } => tracing::warn!(
                        source = source.id(),
                        kind = %kind,
                        "Source failed: {}",
                        message
                    ),
                }

                if self.format == OutputFormat::Text {
                    write_outcome(out, &outcome)?;
                }

                entries.push(SweepEntry {
                    keyword: keyword.clone(),
                    source: source.name().to_string(),
                    outcome,
                });
            }
        }

        if self.format == OutputFormat::Json {
            let document = serde_json::to_string_pretty(&entries)?;
            writeln!(out, "{}", document)?;
        }

        out.flush()?;
        Ok(entries)
    }
}

fn write_header<W: Write>(out: &mut W, source: &str, keyword: &str) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== {} Results for '{}' ===", source, keyword)
}

fn write_outcome<W: Write>(out: &mut W, outcome: &SearchOutcome) -> std::io::Result<()> {
    match outcome {
        SearchOutcome::Success { records } => {
            for record in records {
                writeln!(out, "{}", record.to_pretty_json()?)?;
            }
            writeln!(out, "Number of papers scraped: {}", records.len())
        }
        SearchOutcome::Failure { kind, message } => {
            writeln!(out, "Error ({}): {}", kind, message)
        }
    }
}
