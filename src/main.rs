use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lit_sweep::config::{find_config_file, load_config, Config};
use lit_sweep::sources::SourceRegistry;
use lit_sweep::sweep::{OutputFormat, Sweep};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// lit-sweep - search Google Scholar, CrossRef and Semantic Scholar for a list of keywords
#[derive(Parser, Debug)]
#[command(name = "lit-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search academic sources for a list of keywords and print normalized results", long_about = None)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error log output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keyword to search (repeatable; replaces the configured keywords)
    #[arg(long = "keyword", short = 'k')]
    keywords: Vec<String>,

    /// Maximum number of results per source and keyword
    #[arg(long, short = 'n')]
    max_results: Option<usize>,

    /// Source to query (repeatable; default: all enabled sources)
    #[arg(long = "source", short, value_enum)]
    sources: Vec<SourceArg>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log output format (overrides the configured one)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Available search sources
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SourceArg {
    #[value(name = "google_scholar")]
    GoogleScholar,
    #[value(name = "crossref")]
    CrossRef,
    #[value(name = "semantic")]
    Semantic,
}

impl SourceArg {
    fn id(self) -> &'static str {
        match self {
            SourceArg::GoogleScholar => "google_scholar",
            SourceArg::CrossRef => "crossref",
            SourceArg::Semantic => "semantic",
        }
    }
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// Section headers with one JSON block per record
    Text,
    /// A single JSON document
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Fold command line overrides into the loaded configuration
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if !cli.keywords.is_empty() {
        config.keywords = cli.keywords.clone();
    }
    if let Some(max_results) = cli.max_results {
        config.max_results = max_results;
    }
    if !cli.sources.is_empty() {
        config.sources.enabled = cli.sources.iter().map(|s| s.id().to_string()).collect();
    }
    if let Some(format) = cli.log_format {
        config.logging.format = match format {
            LogFormat::Text => "text".to_string(),
            LogFormat::Json => "json".to_string(),
        };
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let json = config.logging.format.eq_ignore_ascii_case("json");

    // Logs go to stderr; stdout carries the results
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lit_sweep={}", log_level)),
        ))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&cli, &mut config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&cli, &config);

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let registry = SourceRegistry::from_config(&config).context("Failed to set up sources")?;
    if registry.is_empty() {
        anyhow::bail!("No sources enabled");
    }

    tracing::info!(
        sources = registry.len(),
        keywords = config.keywords.len(),
        "Starting sweep"
    );

    let format = match cli.format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
    };

    let sweep = Sweep::new(registry.all())
        .max_results(config.max_results)
        .format(format);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let entries = sweep.run(&config.keywords, &mut out).await?;

    let failures = entries.iter().filter(|e| !e.outcome.is_success()).count();
    tracing::info!(
        searches = entries.len(),
        failures,
        "Sweep complete"
    );

    Ok(())
}
