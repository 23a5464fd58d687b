//! librdkafka-backed broker client

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rdkafka_wrap::ClientConfig;
use rdkafka_wrap::Message;
use rdkafka_wrap::client::ClientContext;
use rdkafka_wrap::producer::{BaseProducer, BaseRecord, DeliveryResult, Producer, ProducerContext};
use rdkafka_wrap::util::Timeout;

use crate::broker::{Broker, Delivery};
use crate::config::KafkaConfig;
use crate::error::BrokerError;

/// Poll granularity while waiting for an acknowledgment
const POLL_INTERVAL: Duration = Duration::from_millis(50);

type Slot = Mutex<Option<Result<Delivery, BrokerError>>>;

/// Routes delivery reports back to the slot attached to each message.
struct DeliveryTracker;

impl ClientContext for DeliveryTracker {}

impl ProducerContext for DeliveryTracker {
    type DeliveryOpaque = Arc<Slot>;

    fn delivery(&self, result: &DeliveryResult<'_>, slot: Self::DeliveryOpaque) {
        let report = match result {
            Ok(msg) => Ok(Delivery {
                partition: msg.partition(),
                offset: msg.offset(),
            }),
            Err((e, _)) => Err(BrokerError::Send(e.to_string())),
        };
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }
}

/// Broker client over a librdkafka producer.
pub struct KafkaBroker {
    producer: BaseProducer<DeliveryTracker>,
}

impl KafkaBroker {
    /// Create the producer and confirm the cluster answers a metadata request.
    pub fn connect(config: &KafkaConfig) -> Result<Self, BrokerError> {
        let mut client = ClientConfig::new();
        client.set("bootstrap.servers", &config.brokers);
        for (key, value) in config.client_properties() {
            client.set(key, value);
        }

        let producer: BaseProducer<DeliveryTracker> = client
            .create_with_context(DeliveryTracker)
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        producer
            .client()
            .fetch_metadata(None, Timeout::After(config.ack_timeout()))
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        log::debug!("Connected to {}", config.brokers);
        Ok(Self { producer })
    }
}

impl Broker for KafkaBroker {
    fn send(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError> {
        let slot: Arc<Slot> = Arc::new(Mutex::new(None));
        let mut record =
            BaseRecord::<str, [u8], Arc<Slot>>::with_opaque_to(topic, Arc::clone(&slot))
                .payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }
        self.producer
            .send(record)
            .map_err(|(e, _)| BrokerError::Send(e.to_string()))?;

        let deadline = Instant::now() + timeout;
        loop {
            self.producer.poll(Timeout::After(POLL_INTERVAL));
            if let Some(report) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                return report;
            }
            if Instant::now() >= deadline {
                return Err(BrokerError::Timeout(timeout));
            }
        }
    }

    fn enqueue(&mut self, topic: &str, key: Option<&str>, payload: &[u8]) -> Result<(), BrokerError> {
        let slot: Arc<Slot> = Arc::new(Mutex::new(None));
        let mut record = BaseRecord::<str, [u8], Arc<Slot>>::with_opaque_to(topic, slot).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }
        self.producer
            .send(record)
            .map_err(|(e, _)| BrokerError::Send(e.to_string()))?;
        self.producer.poll(Timeout::After(Duration::ZERO));
        Ok(())
    }

    fn flush(&mut self, timeout: Duration) -> Result<(), BrokerError> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| BrokerError::Flush(e.to_string()))
    }

    fn close(&mut self) {
        // librdkafka tears the connection down when the producer drops
        self.producer.poll(Timeout::After(Duration::ZERO));
    }
}
