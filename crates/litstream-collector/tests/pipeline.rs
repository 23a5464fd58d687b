//! Collector runs against scripted sources and the in-memory broker

use std::cell::Cell;

use chrono::{DateTime, Utc};

use litstream_collector::{Collector, RunStats};
use litstream_core::{CanonicalArticle, Source, SourceKind};
use litstream_kafka::{KafkaConfig, MemoryBroker, PublishError, Publisher};

/// Returns the same records for every query and counts fetches.
struct ScriptedSource {
    articles: Vec<CanonicalArticle>,
    fetches: Cell<usize>,
}

impl ScriptedSource {
    fn new(articles: Vec<CanonicalArticle>) -> Self {
        Self {
            articles,
            fetches: Cell::new(0),
        }
    }
}

impl Source for ScriptedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pubmed
    }

    fn fetch(&self, _query: &str, max_results: usize) -> Vec<CanonicalArticle> {
        self.fetches.set(self.fetches.get() + 1);
        self.articles.iter().take(max_results).cloned().collect()
    }

    fn parse(&self, _payload: &str) -> Vec<CanonicalArticle> {
        Vec::new()
    }
}

fn article(native_id: &str, title: &str) -> CanonicalArticle {
    let collected_at: DateTime<Utc> = "2025-01-01T00:00:00Z".parse().unwrap();
    let mut article = CanonicalArticle::new(SourceKind::Pubmed, native_id, collected_at);
    article.title = title.to_string();
    article
}

fn publisher(broker: &MemoryBroker) -> Publisher<MemoryBroker> {
    let config = KafkaConfig {
        retry_delay_secs: 0,
        ..Default::default()
    };
    Publisher::open(config, broker.connector()).unwrap()
}

#[test]
fn empty_fetch_short_circuits() {
    let broker = MemoryBroker::new();
    let mut collector = Collector::new(ScriptedSource::new(Vec::new()), publisher(&broker));

    let stats = collector.run("crispr", 10).unwrap();
    assert_eq!(stats, RunStats::default());
    assert_eq!(broker.send_calls(), 0);
    assert_eq!(broker.flush_calls(), 0);
    assert_eq!(collector.session().collected, 0);
}

#[test]
fn run_publishes_and_counts() {
    let broker = MemoryBroker::new();
    let source = ScriptedSource::new(vec![article("1", "A"), article("2", ""), article("3", "C")]);
    let mut collector = Collector::new(source, publisher(&broker));

    let stats = collector.run("genomics", 10).unwrap();
    assert_eq!(
        stats,
        RunStats {
            collected: 3,
            sent: 2,
            failed: 0,
            skipped: 1
        }
    );
    assert_eq!(broker.messages_on("articles.raw").len(), 2);

    let session = collector.session();
    assert_eq!((session.collected, session.delivered, session.errors), (3, 2, 0));
}

#[test]
fn session_accumulates_across_queries() {
    let broker = MemoryBroker::new();
    let source = ScriptedSource::new(vec![article("1", "A"), article("2", "B")]);
    let mut collector = Collector::new(source, publisher(&broker));

    collector.run("q1", 10).unwrap();
    collector.run("q2", 1).unwrap();

    assert_eq!(collector.source().fetches.get(), 2);
    assert_eq!(collector.session().collected, 3);
    assert_eq!(collector.session().delivered, 3);
    assert_eq!(collector.publisher().stats().sent, 3);
}

#[test]
fn broker_failures_are_counted_not_raised() {
    let broker = MemoryBroker::new();
    broker.reject_next(1);
    let source = ScriptedSource::new(vec![article("1", "A"), article("2", "B")]);
    let mut collector = Collector::new(source, publisher(&broker));

    let stats = collector.run("q", 10).unwrap();
    assert_eq!((stats.sent, stats.failed), (1, 1));
    assert_eq!(collector.session().errors, 0);
}

#[test]
fn channel_failure_counts_error_and_propagates() {
    let broker = MemoryBroker::new();
    broker.fail_flush(true);
    let source = ScriptedSource::new(vec![article("1", "A")]);
    let mut collector = Collector::new(source, publisher(&broker));

    let err = collector.run("q", 10).unwrap_err();
    assert!(matches!(err, PublishError::Flush(_)));
    assert_eq!(collector.session().errors, 1);
    assert_eq!(collector.session().collected, 1);
    assert_eq!(collector.session().delivered, 0);
}

#[test]
fn finish_closes_channel_and_reports() {
    let broker = MemoryBroker::new();
    let source = ScriptedSource::new(vec![article("1", "A")]);
    let mut collector = Collector::new(source, publisher(&broker));
    collector.run("q", 10).unwrap();

    let report = collector.finish();
    assert!(broker.is_closed());
    assert_eq!(report.source, SourceKind::Pubmed);
    assert_eq!((report.collected, report.delivered, report.errors), (1, 1, 0));
    assert!(report.ended_at >= report.started_at);
}

#[test]
fn dropping_collector_closes_channel() {
    let broker = MemoryBroker::new();
    let collector = Collector::new(ScriptedSource::new(Vec::new()), publisher(&broker));
    drop(collector);
    assert!(broker.is_closed());
}
