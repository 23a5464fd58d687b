//! PubMed adapter configuration

use std::time::Duration;

use serde::Deserialize;

/// Pace with an API key (10 requests/s allowed)
const KEYED_DELAY: Duration = Duration::from_millis(110);
/// Pace without a key (3 requests/s allowed)
const ANONYMOUS_DELAY: Duration = Duration::from_millis(340);

/// Runtime configuration for the PubMed adapter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// E-utilities base URL (without trailing slash)
    pub base_url: String,
    /// NCBI API key; raises the allowed request rate
    pub api_key: Option<String>,
    /// Default cap on PMIDs per query
    pub max_results: usize,
    pub search_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Explicit pacing override; derived from `api_key` when unset
    pub request_delay_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            api_key: None,
            max_results: 100,
            search_timeout_secs: 30,
            fetch_timeout_secs: 60,
            request_delay_ms: None,
        }
    }
}

impl Config {
    /// API key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Minimum interval between consecutive E-utilities calls.
    pub fn request_delay(&self) -> Duration {
        match (self.request_delay_ms, self.api_key()) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, Some(_)) => KEYED_DELAY,
            (None, None) => ANONYMOUS_DELAY,
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
