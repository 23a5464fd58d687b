//! Validating publisher over a [`Broker`]

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use litstream_core::{Invalid, Publishable, retry_fixed};

use crate::broker::{Broker, Delivery};
use crate::config::KafkaConfig;
use crate::error::{BrokerError, PublishError};

/// Lifecycle of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Cumulative counters over the life of a publisher
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of one [`Publisher::send_batch`] call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.sent + self.failed + self.skipped
    }
}

/// What happened to a single record
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent(Delivery),
    Failed(BrokerError),
    Skipped(Invalid),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Delivery channel for articles and interactions.
///
/// Not shared between threads: every send mutates the counters. Run one
/// publisher per collector. Dropping a publisher closes it.
pub struct Publisher<B: Broker> {
    config: KafkaConfig,
    broker: Option<B>,
    state: ChannelState,
    stats: PublishStats,
}

impl<B: Broker> Publisher<B> {
    /// Open a channel, calling `connect` up to `max_retries` times with
    /// `retry_delay` between attempts.
    pub fn open(
        config: KafkaConfig,
        mut connect: impl FnMut() -> Result<B, BrokerError>,
    ) -> Result<Self, PublishError> {
        log::debug!(
            "Channel {:?} -> {:?}: {}",
            ChannelState::Disconnected,
            ChannelState::Connecting,
            config.brokers
        );

        let label = format!("Connect to {}", config.brokers);
        let broker = retry_fixed(&label, config.max_retries, config.retry_delay(), |_| connect())
            .map_err(|e| PublishError::ConnectionRefused {
                broker: config.brokers.clone(),
                attempts: e.attempts,
                last: e.last,
            })?;

        log::info!("Connected to {}", config.brokers);
        Ok(Self {
            config,
            broker: Some(broker),
            state: ChannelState::Connected,
            stats: PublishStats::default(),
        })
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    fn open_broker(&mut self) -> Result<&mut B, PublishError> {
        match self.state {
            ChannelState::Connected => self.broker.as_mut().ok_or(PublishError::Closed),
            _ => Err(PublishError::Closed),
        }
    }

    /// Validate and send one record to the articles topic, keyed by its id.
    ///
    /// Invalid records are skipped without touching the broker. Broker
    /// failures and acknowledgment timeouts count as failed and are
    /// reported in the outcome, never as `Err`.
    pub fn send_article<R: Publishable>(&mut self, record: &R) -> Result<SendOutcome, PublishError> {
        self.open_broker()?;

        if let Err(reason) = record.validate() {
            log::warn!("Skipping invalid record {:?}: {reason}", record.key());
            self.stats.skipped += 1;
            return Ok(SendOutcome::Skipped(reason));
        }

        let ack_timeout = self.config.ack_timeout();
        let topic = self.config.articles_topic.clone();
        let broker = self.open_broker()?;
        let result = serde_json::to_vec(record)
            .map_err(|e| BrokerError::Serialize(e.to_string()))
            .and_then(|payload| broker.send(&topic, Some(record.key()), &payload, ack_timeout));

        match result {
            Ok(delivery) => {
                log::debug!(
                    "Sent {} to {topic} [partition {}, offset {}]",
                    record.key(),
                    delivery.partition,
                    delivery.offset
                );
                self.stats.sent += 1;
                Ok(SendOutcome::Sent(delivery))
            }
            Err(e) => {
                log::error!("Failed to send {}: {e}", record.key());
                self.stats.failed += 1;
                Ok(SendOutcome::Failed(e))
            }
        }
    }

    /// Send every record once, then flush.
    ///
    /// `sent + failed + skipped` always equals `records.len()`. A failed
    /// flush is returned as an error after all records were attempted.
    /// An empty batch does not touch the broker.
    pub fn send_batch<R: Publishable>(&mut self, records: &[R]) -> Result<BatchStats, PublishError> {
        let mut batch = BatchStats::default();
        if records.is_empty() {
            return Ok(batch);
        }
        for record in records {
            match self.send_article(record)? {
                SendOutcome::Sent(_) => batch.sent += 1,
                SendOutcome::Failed(_) => batch.failed += 1,
                SendOutcome::Skipped(_) => batch.skipped += 1,
            }
        }

        self.flush()?;
        log::info!(
            "Batch of {}: {} sent, {} failed, {} skipped",
            records.len(),
            batch.sent,
            batch.failed,
            batch.skipped
        );
        Ok(batch)
    }

    /// Wait for buffered messages to reach the broker.
    pub fn flush(&mut self) -> Result<(), PublishError> {
        let timeout = self.config.flush_timeout();
        self.open_broker()?
            .flush(timeout)
            .map_err(PublishError::Flush)
    }

    /// Fire-and-forget an interaction event to the interactions topic.
    ///
    /// A `timestamp` is added when the event has none. Failures are logged
    /// and reported as `false`; they never affect article statistics.
    pub fn send_interaction(&mut self, mut interaction: Value) -> bool {
        let Some(fields) = interaction.as_object_mut() else {
            log::error!("Interaction must be a JSON object, got {interaction}");
            return false;
        };
        fields
            .entry("timestamp")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));

        let topic = self.config.interactions_topic.clone();
        let flush_timeout = self.config.flush_timeout();
        let broker = match self.open_broker() {
            Ok(broker) => broker,
            Err(e) => {
                log::error!("Cannot send interaction: {e}");
                return false;
            }
        };

        let result = serde_json::to_vec(&interaction)
            .map_err(|e| BrokerError::Serialize(e.to_string()))
            .and_then(|payload| broker.enqueue(&topic, None, &payload))
            .and_then(|()| broker.flush(flush_timeout));
        match result {
            Ok(()) => {
                log::debug!("Interaction sent to {topic}");
                true
            }
            Err(e) => {
                log::error!("Failed to send interaction: {e}");
                false
            }
        }
    }

    /// Flush and release the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state == ChannelState::Closed {
            return;
        }
        if let Some(mut broker) = self.broker.take() {
            if let Err(e) = broker.flush(self.config.flush_timeout()) {
                log::warn!("Flush on close failed: {e}");
            }
            broker.close();
        }
        self.state = ChannelState::Closed;
        log::info!(
            "Channel to {} ({}) closed: {} sent, {} failed, {} skipped",
            self.config.brokers,
            self.config.articles_topic,
            self.stats.sent,
            self.stats.failed,
            self.stats.skipped
        );
    }
}

impl<B: Broker> Drop for Publisher<B> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBroker;
    use serde_json::json;

    fn config() -> KafkaConfig {
        KafkaConfig {
            max_retries: 3,
            retry_delay_secs: 0,
            ..Default::default()
        }
    }

    fn publisher(broker: &MemoryBroker) -> Publisher<MemoryBroker> {
        Publisher::open(config(), broker.connector()).unwrap()
    }

    #[test]
    fn opens_connected() {
        let broker = MemoryBroker::new();
        let publisher = publisher(&broker);
        assert_eq!(publisher.state(), ChannelState::Connected);
        assert_eq!(publisher.stats(), PublishStats::default());
        assert_eq!(broker.connect_calls(), 1);
    }

    #[test]
    fn connect_retries_until_success() {
        let broker = MemoryBroker::new();
        broker.refuse_connections(2);
        let publisher = publisher(&broker);
        assert_eq!(publisher.state(), ChannelState::Connected);
        assert_eq!(broker.connect_calls(), 3);
    }

    #[test]
    fn connect_exhaustion_is_refused() {
        let broker = MemoryBroker::new();
        broker.refuse_connections(10);
        let err = Publisher::open(config(), broker.connector()).err().unwrap();
        match err {
            PublishError::ConnectionRefused {
                broker: addr,
                attempts,
                ..
            } => {
                assert_eq!(addr, "localhost:9092");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(broker.connect_calls(), 3);
    }

    #[test]
    fn interaction_gets_timestamp_and_no_key() {
        let broker = MemoryBroker::new();
        let mut publisher = publisher(&broker);
        assert!(publisher.send_interaction(json!({"user_id": "u1", "action": "view"})));

        let messages = broker.messages_on("users.interactions");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, None);
        let event = messages[0].json();
        assert_eq!(event["user_id"], "u1");
        assert!(event["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(publisher.stats(), PublishStats::default());
    }

    #[test]
    fn interaction_keeps_existing_timestamp() {
        let broker = MemoryBroker::new();
        let mut publisher = publisher(&broker);
        publisher.send_interaction(json!({"timestamp": "2025-01-01T00:00:00Z"}));
        assert_eq!(
            broker.messages()[0].json()["timestamp"],
            "2025-01-01T00:00:00Z"
        );
    }

    #[test]
    fn interaction_failure_is_reported_not_raised() {
        let broker = MemoryBroker::new();
        let mut publisher = publisher(&broker);
        broker.reject_next(1);
        assert!(!publisher.send_interaction(json!({"user_id": "u1"})));
        assert!(!publisher.send_interaction(json!(["not", "an", "object"])));
    }

    #[test]
    fn close_is_idempotent() {
        let broker = MemoryBroker::new();
        let mut publisher = publisher(&broker);
        publisher.close();
        publisher.close();
        assert_eq!(publisher.state(), ChannelState::Closed);
        assert!(broker.is_closed());
        assert_eq!(broker.flush_calls(), 1);
        drop(publisher);
        assert_eq!(broker.flush_calls(), 1);
    }

    #[test]
    fn drop_closes() {
        let broker = MemoryBroker::new();
        drop(publisher(&broker));
        assert!(broker.is_closed());
    }

    #[test]
    fn closed_channel_rejects_sends() {
        let broker = MemoryBroker::new();
        let mut publisher = publisher(&broker);
        publisher.close();
        let record = json!({"id": "pubmed_1", "source": "pubmed", "title": "X", "collected_at": "t"});
        assert!(matches!(
            publisher.send_article(&record),
            Err(PublishError::Closed)
        ));
        assert!(matches!(
            publisher.send_batch(&[record]),
            Err(PublishError::Closed)
        ));
        assert!(!publisher.send_interaction(json!({})));
        assert_eq!(broker.send_calls(), 0);
    }
}
