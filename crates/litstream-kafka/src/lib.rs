//! Delivery channel for canonical articles and user interactions
//!
//! [`Publisher`] validates records, serializes them to JSON and sends them
//! through a [`Broker`]. Articles are keyed by id; interactions are not.
//! The broker is abstracted so collectors can run against
//! [`MemoryBroker`] in dry runs and tests.

pub mod broker;
pub mod config;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod publisher;

pub use broker::{Broker, Delivery};
pub use config::KafkaConfig;
pub use error::{BrokerError, PublishError};
#[cfg(feature = "kafka")]
pub use kafka::KafkaBroker;
pub use memory::{MemoryBroker, StoredMessage};
pub use publisher::{BatchStats, ChannelState, PublishStats, Publisher, SendOutcome};
