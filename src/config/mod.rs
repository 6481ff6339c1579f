//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `LIT_SWEEP_` (nested keys use `__`,
//! e.g. `LIT_SWEEP_RETRY__MAX_ATTEMPTS=3`; `LIT_SWEEP_KEYWORDS` takes a
//! `;`-separated list).
//!
//! # Configuration File Format
//!
//! ```toml
//! keywords = ["cyber deception", "genai"]
//! max_results = 100
//!
//! [sources]
//! enabled = ["google_scholar", "crossref", "semantic"]
//! disabled = []
//!
//! [endpoints]
//! google_scholar = "https://scholar.google.com"
//! crossref = "https://api.crossref.org"
//! semantic = "https://api.semanticscholar.org/graph/v1"
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [google_scholar]
//! page_delay_ms = 1000
//!
//! [semantic]
//! request_delay_ms = 2000
//!
//! [retry]
//! max_attempts = 5
//! initial_delay_ms = 5000
//! backoff_multiplier = 1.0
//! max_delay_ms = 60000
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "lit-sweep.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "LIT_SWEEP";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Keywords swept in order
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Maximum records requested from each source per keyword
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub google_scholar: ScholarConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            max_results: default_max_results(),
            sources: SourcesConfig::default(),
            endpoints: EndpointsConfig::default(),
            http: HttpConfig::default(),
            google_scholar: ScholarConfig::default(),
            semantic: SemanticConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "cyber deception",
        "genai",
        "cyber deception AND genai",
        "\"cyber deception\" AND \"LLM\"",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_results() -> usize {
    100
}

/// Which sources take part in the sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Only use these source ids; empty means all
    #[serde(default)]
    pub enabled: Vec<String>,

    /// Never use these source ids
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl SourcesConfig {
    /// `disabled` always wins over `enabled`
    pub fn is_enabled(&self, id: &str) -> bool {
        let allowed = self.enabled.is_empty() || self.enabled.iter().any(|s| s == id);
        allowed && !self.disabled.iter().any(|s| s == id)
    }
}

/// Base URLs of the upstream services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_google_scholar")]
    pub google_scholar: String,

    #[serde(default = "default_crossref")]
    pub crossref: String,

    #[serde(default = "default_semantic")]
    pub semantic: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            google_scholar: default_google_scholar(),
            crossref: default_crossref(),
            semantic: default_semantic(),
        }
    }
}

fn default_google_scholar() -> String {
    "https://scholar.google.com".to_string()
}

fn default_crossref() -> String {
    "https://api.crossref.org".to_string()
}

fn default_semantic() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

/// Outbound HTTP settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Google Scholar specific settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarConfig {
    /// Pause between consecutive result pages
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay(),
        }
    }
}

fn default_page_delay() -> u64 {
    1_000
}

/// Semantic Scholar specific settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Pause before every request, including retries
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
        }
    }
}

fn default_request_delay() -> u64 {
    2_000
}

/// Retry schedule for rate-limited requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_delay() -> u64 {
    60_000
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Render as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, None)
}

/// Load configuration, reading `LIT_SWEEP_*` variables from `env` instead of
/// the process environment when given
fn load_config_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(";")
                .with_list_parse_key("keywords")
                .with_list_parse_key("sources.enabled")
                .with_list_parse_key("sources.disabled")
                .source(env),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("lit-sweep").join("config.toml"))
        .filter(|path| path.is_file())
}
