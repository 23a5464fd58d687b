//! E-utilities client: esearch (JSON) then chunked efetch (XML)

use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;

use litstream_core::{CanonicalArticle, HttpTransport, Pacer, Source, SourceKind, Transport};

use crate::config::Config;
use crate::parser::parse_pubmed_xml;
use crate::transform::to_article;

/// Upstream hard limit on PMIDs per efetch request
pub const FETCH_CHUNK: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// PubMed source adapter.
///
/// Every upstream call (search and each efetch chunk) goes through one
/// pacer, so consecutive calls are at least `request_delay` apart even
/// across queries.
pub struct PubmedSource<T = HttpTransport> {
    config: Config,
    transport: T,
    pacer: Pacer,
}

impl PubmedSource<HttpTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, HttpTransport)
    }
}

impl<T: Transport> PubmedSource<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        let pacer = Pacer::new(config.request_delay());
        log::debug!(
            "PubMed adapter: {} (api key {}, {:?} between calls)",
            config.base_url,
            if config.api_key().is_some() { "set" } else { "not set" },
            pacer.interval()
        );
        Self {
            config,
            transport,
            pacer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn with_key(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(key) = self.config.api_key() {
            params.push(("api_key", key.to_string()));
        }
        params
    }

    /// Phase 1: PMIDs matching `query`, at most `max_results`.
    pub fn search_ids(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/esearch.fcgi", self.config.base_url);
        let params = self.with_key(vec![
            ("db", "pubmed".into()),
            ("term", query.into()),
            ("retmax", max_results.to_string()),
            ("retmode", "json".into()),
            ("sort", "relevance".into()),
            ("usehistory", "n".into()),
        ]);

        self.pacer.wait();
        let body = self
            .transport
            .get(&url, &params, self.config.search_timeout())
            .context("esearch request failed")?;
        let response: SearchResponse =
            serde_json::from_str(&body).context("Invalid esearch JSON")?;

        let mut ids = response.esearchresult.idlist;
        ids.truncate(max_results);
        log::info!("esearch '{query}': {} PMIDs", ids.len());
        Ok(ids)
    }

    /// Phase 2: full XML for `pmids`, in chunks of [`FETCH_CHUNK`].
    ///
    /// Chunk payloads are concatenated with newlines. A failed chunk is
    /// logged and left out; the other chunks still count.
    pub fn fetch_details(&self, pmids: &[String]) -> String {
        let url = format!("{}/efetch.fcgi", self.config.base_url);
        let mut payloads = Vec::with_capacity(pmids.len().div_ceil(FETCH_CHUNK));

        for (i, chunk) in pmids.chunks(FETCH_CHUNK).enumerate() {
            let params = self.with_key(vec![
                ("db", "pubmed".into()),
                ("id", chunk.join(",")),
                ("retmode", "xml".into()),
                ("rettype", "abstract".into()),
            ]);

            self.pacer.wait();
            match self
                .transport
                .get(&url, &params, self.config.fetch_timeout())
            {
                Ok(xml) => payloads.push(xml),
                Err(e) => log::error!(
                    "efetch chunk {i} ({} PMIDs) failed: {e}",
                    chunk.len()
                ),
            }
        }

        payloads.join("\n")
    }
}

impl<T: Transport> Source for PubmedSource<T> {
    fn kind(&self) -> SourceKind {
        SourceKind::Pubmed
    }

    fn fetch(&self, query: &str, max_results: usize) -> Vec<CanonicalArticle> {
        let pmids = match self.search_ids(query, max_results) {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("PubMed search '{query}' failed: {e:#}");
                return Vec::new();
            }
        };
        if pmids.is_empty() {
            return Vec::new();
        }

        let xml = self.fetch_details(&pmids);
        if xml.is_empty() {
            return Vec::new();
        }

        let articles = self.parse(&xml);
        log::info!(
            "PubMed '{query}': {}/{} articles parsed",
            articles.len(),
            pmids.len()
        );
        articles
    }

    fn parse(&self, payload: &str) -> Vec<CanonicalArticle> {
        let collected_at = Utc::now();
        let parsed = parse_pubmed_xml(payload);
        if parsed.failed > 0 {
            log::warn!("{} PubMed records could not be parsed", parsed.failed);
        }
        parsed
            .records
            .into_iter()
            .filter_map(|record| to_article(record, collected_at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    use litstream_core::StreamError;

    type Call = (String, Vec<(String, String)>);

    /// Records every call and answers from a closure.
    struct FakeTransport<F> {
        calls: RefCell<Vec<Call>>,
        respond: F,
    }

    impl<F> FakeTransport<F>
    where
        F: Fn(&str, &[(&str, String)]) -> Result<String, StreamError>,
    {
        fn new(respond: F) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                respond,
            }
        }

        fn calls_to(&self, endpoint: &str) -> Vec<Call> {
            self.calls
                .borrow()
                .iter()
                .filter(|(url, _)| url.ends_with(endpoint))
                .cloned()
                .collect()
        }
    }

    impl<F> Transport for FakeTransport<F>
    where
        F: Fn(&str, &[(&str, String)]) -> Result<String, StreamError>,
    {
        fn get(
            &self,
            url: &str,
            params: &[(&str, String)],
            _timeout: Duration,
        ) -> Result<String, StreamError> {
            self.calls.borrow_mut().push((
                url.to_string(),
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            (self.respond)(url, params)
        }
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    fn fast_config() -> Config {
        Config {
            base_url: "http://eutils.test".into(),
            request_delay_ms: Some(0),
            ..Default::default()
        }
    }

    fn search_json(ids: &[String]) -> String {
        serde_json::json!({ "esearchresult": { "idlist": ids } }).to_string()
    }

    /// One efetch document holding an article per requested PMID.
    fn efetch_xml(ids: &str) -> String {
        let articles: String = ids
            .split(',')
            .map(|id| {
                format!(
                    "<PubmedArticle><MedlineCitation><PMID>{id}</PMID><Article>\
                     <ArticleTitle>Title {id}</ArticleTitle></Article></MedlineCitation></PubmedArticle>"
                )
            })
            .collect();
        format!("<?xml version=\"1.0\"?><PubmedArticleSet>{articles}</PubmedArticleSet>")
    }

    fn upstream(n: usize) -> impl Fn(&str, &[(&str, String)]) -> Result<String, StreamError> {
        let ids: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        move |url: &str, params: &[(&str, String)]| {
            if url.ends_with("esearch.fcgi") {
                Ok(search_json(&ids))
            } else {
                Ok(efetch_xml(param(params, "id").unwrap_or_default()))
            }
        }
    }

    #[test]
    fn chunks_large_id_lists() {
        let transport = FakeTransport::new(upstream(450));
        let source = PubmedSource::with_transport(fast_config(), &transport);

        let articles = source.fetch("genomics", 450);

        let fetches = transport.calls_to("efetch.fcgi");
        assert_eq!(fetches.len(), 3);
        let sizes: Vec<usize> = fetches
            .iter()
            .map(|(_, p)| {
                let ids = &p.iter().find(|(k, _)| k == "id").unwrap().1;
                ids.split(',').count()
            })
            .collect();
        assert_eq!(sizes, vec![200, 200, 50]);
        assert_eq!(articles.len(), 450);
        assert_eq!(articles[0].id, "pubmed_1");
        assert_eq!(articles[449].id, "pubmed_450");
    }

    #[test]
    fn exactly_one_chunk_at_limit() {
        let transport = FakeTransport::new(upstream(200));
        let source = PubmedSource::with_transport(fast_config(), &transport);
        source.fetch("q", 200);
        assert_eq!(transport.calls_to("efetch.fcgi").len(), 1);
    }

    #[test]
    fn search_params() {
        let transport = FakeTransport::new(upstream(1));
        let config = Config {
            api_key: Some("k".into()),
            ..fast_config()
        };
        let source = PubmedSource::with_transport(config, &transport);
        source.fetch("crispr", 7);

        let searches = transport.calls_to("esearch.fcgi");
        let (url, params) = &searches[0];
        assert_eq!(url, "http://eutils.test/esearch.fcgi");
        let get = |k: &str| params.iter().find(|(p, _)| p == k).map(|(_, v)| v.as_str());
        assert_eq!(get("db"), Some("pubmed"));
        assert_eq!(get("term"), Some("crispr"));
        assert_eq!(get("retmax"), Some("7"));
        assert_eq!(get("retmode"), Some("json"));
        assert_eq!(get("api_key"), Some("k"));

        let fetches = transport.calls_to("efetch.fcgi");
        let (_, fetch_params) = &fetches[0];
        assert!(fetch_params.iter().any(|(k, v)| k == "rettype" && v == "abstract"));
        assert!(fetch_params.iter().any(|(k, _)| k == "api_key"));
    }

    #[test]
    fn no_api_key_param_without_key() {
        let transport = FakeTransport::new(upstream(1));
        let source = PubmedSource::with_transport(fast_config(), &transport);
        source.fetch("q", 1);
        let searches = transport.calls_to("esearch.fcgi");
        let (_, params) = &searches[0];
        assert!(params.iter().all(|(k, _)| k != "api_key"));
    }

    #[test]
    fn search_failure_yields_empty() {
        let transport = FakeTransport::new(|_: &str, _: &[(&str, String)]| {
            Err(StreamError::Http {
                status: Some(503),
                message: "unavailable".into(),
            })
        });
        let source = PubmedSource::with_transport(fast_config(), &transport);
        assert!(source.fetch("q", 10).is_empty());
        assert!(transport.calls_to("efetch.fcgi").is_empty());
    }

    #[test]
    fn invalid_search_json_yields_empty() {
        let transport =
            FakeTransport::new(|_: &str, _: &[(&str, String)]| Ok("<html>oops</html>".into()));
        let source = PubmedSource::with_transport(fast_config(), &transport);
        assert!(source.fetch("q", 10).is_empty());
    }

    #[test]
    fn empty_search_skips_fetch() {
        let transport = FakeTransport::new(upstream(0));
        let source = PubmedSource::with_transport(fast_config(), &transport);
        assert!(source.fetch("q", 10).is_empty());
        assert_eq!(transport.calls.borrow().len(), 1);
    }

    #[test]
    fn failed_chunk_keeps_others() {
        let ids: Vec<String> = (1..=250).map(|i| i.to_string()).collect();
        let transport = FakeTransport::new(move |url: &str, params: &[(&str, String)]| {
            if url.ends_with("esearch.fcgi") {
                return Ok(search_json(&ids));
            }
            let chunk = param(params, "id").unwrap_or_default();
            if chunk.starts_with("1,") {
                Err(StreamError::Http {
                    status: Some(500),
                    message: "boom".into(),
                })
            } else {
                Ok(efetch_xml(chunk))
            }
        });
        let source = PubmedSource::with_transport(fast_config(), &transport);
        let articles = source.fetch("q", 250);
        assert_eq!(articles.len(), 50);
        assert_eq!(articles[0].id, "pubmed_201");
    }

    #[test]
    fn calls_are_paced() {
        let transport = FakeTransport::new(upstream(1));
        let config = Config {
            request_delay_ms: Some(40),
            ..fast_config()
        };
        let source = PubmedSource::with_transport(config, &transport);
        let start = std::time::Instant::now();
        source.fetch("q", 1);
        source.fetch("q", 1);
        // Four calls, three gaps
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn parse_drops_untitled_records() {
        let source = PubmedSource::with_transport(fast_config(), FakeTransport::new(upstream(0)));
        let xml = "<PubmedArticleSet>\
            <PubmedArticle><MedlineCitation><PMID>1</PMID></MedlineCitation></PubmedArticle>\
            <PubmedArticle><MedlineCitation><PMID>2</PMID><Article><ArticleTitle>Kept</ArticleTitle></Article></MedlineCitation></PubmedArticle>\
            </PubmedArticleSet>";
        let articles = source.parse(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept");
    }
}
