//! arXiv API client: one Atom query per fetch

use chrono::Utc;

use litstream_core::{CanonicalArticle, HttpTransport, Source, SourceKind, StreamError, Transport};

use crate::config::Config;
use crate::feed::parse_feed;
use crate::transform::to_article;

/// arXiv source adapter.
///
/// Sleeps for the configured cooldown after every upstream call,
/// successful or not.
pub struct ArxivSource<T = HttpTransport> {
    config: Config,
    transport: T,
}

impl ArxivSource<HttpTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, HttpTransport)
    }
}

impl<T: Transport> ArxivSource<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Raw Atom feed for `query`, newest submissions first.
    pub fn query_feed(&self, query: &str, max_results: usize) -> Result<String, StreamError> {
        let params = [
            ("search_query", self.config.search_query(query)),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let result = self
            .transport
            .get(&self.config.base_url, &params, self.config.timeout());
        std::thread::sleep(self.config.cooldown());
        result
    }
}

impl<T: Transport> Source for ArxivSource<T> {
    fn kind(&self) -> SourceKind {
        SourceKind::Arxiv
    }

    fn fetch(&self, query: &str, max_results: usize) -> Vec<CanonicalArticle> {
        let feed = match self.query_feed(query, max_results) {
            Ok(feed) => feed,
            Err(e) => {
                log::error!("arXiv query '{query}' failed: {e}");
                return Vec::new();
            }
        };

        let articles = self.parse(&feed);
        log::info!("arXiv '{query}': {} articles collected", articles.len());
        articles
    }

    fn parse(&self, payload: &str) -> Vec<CanonicalArticle> {
        let collected_at = Utc::now();
        let parsed = parse_feed(payload);
        if parsed.failed > 0 {
            log::warn!("{} arXiv entries could not be parsed", parsed.failed);
        }

        parsed
            .entries
            .into_iter()
            .filter(|entry| {
                if entry.is_error() {
                    log::error!("arXiv API error: {}", entry.summary.trim());
                }
                !entry.is_error()
            })
            .filter_map(|entry| to_article(entry, collected_at))
            .collect()
    }
}
