//! Configuration loading: defaults, TOML file, then environment

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use litstream_kafka::KafkaConfig;

/// Queries collected when none are configured
pub const DEFAULT_QUERIES: [&str; 8] = [
    "bioinformatics deep learning",
    "genomics transformer model",
    "protein structure prediction",
    "CRISPR gene editing machine learning",
    "RNA sequencing analysis",
    "variant calling deep learning",
    "single cell RNA seq",
    "drug discovery neural network",
];

/// Global configuration for litstream
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub queries: Vec<String>,
    /// arXiv only runs the first `arxiv_queries` queries
    pub arxiv_queries: usize,
    pub pubmed: litstream_pubmed::Config,
    pub arxiv: litstream_arxiv::Config,
    pub kafka: KafkaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            arxiv_queries: 4,
            pubmed: Default::default(),
            arxiv: Default::default(),
            kafka: Default::default(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./litstream.toml (current directory)
    /// 2. ~/.config/litstream/config.toml
    ///
    /// If no config file found, returns default config.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let mut config = Self::find_file()?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load a specific file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn find_file() -> Result<Self> {
        let local_config = PathBuf::from("litstream.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "litstream") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override settings from environment variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("KAFKA_BROKER_EXTERNAL") {
            self.kafka.brokers = v;
        }
        if let Some(v) = var("KAFKA_TOPIC_ARTICLES_RAW") {
            self.kafka.articles_topic = v;
        }
        if let Some(v) = var("KAFKA_TOPIC_USER_INTERACTIONS") {
            self.kafka.interactions_topic = v;
        }
        if let Some(v) = var("KAFKA_CONNECT_MAX_RETRIES") {
            self.kafka.max_retries = parse_var("KAFKA_CONNECT_MAX_RETRIES", &v)?;
        }
        if let Some(v) = var("KAFKA_CONNECT_RETRY_DELAY_SECS") {
            self.kafka.retry_delay_secs = parse_var("KAFKA_CONNECT_RETRY_DELAY_SECS", &v)?;
        }
        if let Some(v) = var("PUBMED_BASE_URL") {
            self.pubmed.base_url = v;
        }
        if let Some(v) = var("PUBMED_API_KEY") {
            self.pubmed.api_key = Some(v);
        }
        if let Some(v) = var("PUBMED_MAX_RESULTS_PER_QUERY") {
            self.pubmed.max_results = parse_var("PUBMED_MAX_RESULTS_PER_QUERY", &v)?;
        }
        if let Some(v) = var("ARXIV_BASE_URL") {
            self.arxiv.base_url = v;
        }
        if let Some(v) = var("ARXIV_MAX_RESULTS_PER_QUERY") {
            self.arxiv.max_results = parse_var("ARXIV_MAX_RESULTS_PER_QUERY", &v)?;
        }
        if let Some(v) = var("SEARCH_QUERIES") {
            let queries: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect();
            if !queries.is_empty() {
                self.queries = queries;
            }
        }
        Ok(())
    }

    /// Queries the arXiv collector runs.
    pub fn arxiv_queries(&self) -> &[String] {
        &self.queries[..self.arxiv_queries.min(self.queries.len())]
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {name}: {value:?}"))
}
