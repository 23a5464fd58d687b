//! arXiv adapter configuration

use std::time::Duration;

use serde::Deserialize;

/// Subject categories every query is restricted to
pub const DEFAULT_CATEGORIES: [&str; 5] = ["cs.LG", "q-bio.GN", "q-bio.BM", "cs.AI", "stat.ML"];

/// Runtime configuration for the arXiv adapter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Atom query endpoint
    pub base_url: String,
    /// Default cap on entries per query
    pub max_results: usize,
    pub timeout_secs: u64,
    /// Pause after every upstream call (shared rate budget)
    pub cooldown_secs: u64,
    /// OR-joined into the `cat:` filter
    pub categories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://export.arxiv.org/api/query".to_string(),
            max_results: 50,
            timeout_secs: 30,
            cooldown_secs: 3,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// `({query}) AND (cat:a OR cat:b ...)`, or the bare query when no
    /// categories are configured.
    pub fn search_query(&self, query: &str) -> String {
        if self.categories.is_empty() {
            return query.to_string();
        }
        let filter = self
            .categories
            .iter()
            .map(|c| format!("cat:{c}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({query}) AND ({filter})")
    }
}
