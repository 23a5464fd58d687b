//! Broker client interface

use std::time::Duration;

use crate::error::BrokerError;

/// Where the broker stored an acknowledged message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// Minimal synchronous producer surface the publisher needs.
///
/// Implementations block in `send` until the broker acknowledges or
/// `timeout` elapses; a late acknowledgment is reported as
/// [`BrokerError::Timeout`].
pub trait Broker {
    /// Send `payload` to `topic`. A key pins the message to one partition.
    fn send(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError>;

    /// Queue `payload` without waiting for an acknowledgment.
    ///
    /// Delivery is only confirmed by a later [`flush`](Broker::flush).
    fn enqueue(&mut self, topic: &str, key: Option<&str>, payload: &[u8]) -> Result<(), BrokerError> {
        self.send(topic, key, payload, Duration::ZERO).map(|_| ())
    }

    /// Wait for every buffered message to be written.
    fn flush(&mut self, timeout: Duration) -> Result<(), BrokerError>;

    /// Release the connection. Called once, after a final flush.
    fn close(&mut self);
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn send(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError> {
        (**self).send(topic, key, payload, timeout)
    }

    fn enqueue(&mut self, topic: &str, key: Option<&str>, payload: &[u8]) -> Result<(), BrokerError> {
        (**self).enqueue(topic, key, payload)
    }

    fn flush(&mut self, timeout: Duration) -> Result<(), BrokerError> {
        (**self).flush(timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
