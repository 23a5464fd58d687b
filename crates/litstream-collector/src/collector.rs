//! Fetch-then-publish orchestration

use chrono::Utc;

use litstream_core::Source;
use litstream_kafka::{Broker, PublishError, Publisher};

use crate::stats::{RunStats, SessionReport, SessionStats};

/// Drives one source into one delivery channel.
///
/// The collector owns its publisher; the channel is closed when the
/// collector is finished or dropped, on success and error paths alike.
pub struct Collector<S: Source, B: Broker> {
    source: S,
    publisher: Publisher<B>,
    session: SessionStats,
}

impl<S: Source, B: Broker> Collector<S, B> {
    pub fn new(source: S, publisher: Publisher<B>) -> Self {
        Self {
            source,
            publisher,
            session: SessionStats::new(Utc::now()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn publisher(&self) -> &Publisher<B> {
        &self.publisher
    }

    pub fn session(&self) -> &SessionStats {
        &self.session
    }

    /// Collect up to `max_results` records for `query` and publish them.
    ///
    /// An empty fetch returns zeroed stats without touching the channel.
    /// Channel failures are counted as session errors and returned.
    pub fn run(&mut self, query: &str, max_results: usize) -> Result<RunStats, PublishError> {
        let kind = self.source.kind();
        log::info!("{kind}: collecting '{query}' (max {max_results})");

        let articles = self.source.fetch(query, max_results);
        if articles.is_empty() {
            log::info!("{kind}: nothing collected for '{query}'");
            return Ok(RunStats::default());
        }

        let collected = articles.len();
        self.session.collected += collected;

        let batch = match self.publisher.send_batch(&articles) {
            Ok(batch) => batch,
            Err(e) => {
                self.session.errors += 1;
                log::error!("{kind}: publishing '{query}' failed: {e}");
                return Err(e);
            }
        };
        self.session.delivered += batch.sent;

        let stats = RunStats::from_batch(collected, batch);
        log::info!(
            "{kind}: '{query}' -> {} collected, {} sent, {} failed, {} skipped",
            stats.collected,
            stats.sent,
            stats.failed,
            stats.skipped
        );
        Ok(stats)
    }

    /// Close the channel and return the session summary.
    pub fn finish(mut self) -> SessionReport {
        self.publisher.close();
        let report = self.session.report(self.source.kind(), Utc::now());
        log::info!("=== {} Session Summary ===", report.source);
        log::info!(
            "Collected: {}, delivered: {}, errors: {}",
            report.collected,
            report.delivered,
            report.errors
        );
        log::info!("Time: {:.1}s", report.elapsed().num_milliseconds() as f64 / 1000.0);
        report
    }
}
