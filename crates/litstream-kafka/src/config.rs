//! Delivery channel configuration

use std::time::Duration;

use serde::Deserialize;

/// Runtime configuration for the delivery channel
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct KafkaConfig {
    /// Bootstrap servers, comma-separated
    pub brokers: String,
    pub articles_topic: String,
    pub interactions_topic: String,
    /// Connection attempts before giving up
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// How long a send waits for the broker acknowledgment
    pub ack_timeout_secs: u64,
    pub flush_timeout_secs: u64,
    /// Extra client properties as `key = value` lines
    pub config: Vec<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            articles_topic: "articles.raw".to_string(),
            interactions_topic: "users.interactions".to_string(),
            max_retries: 5,
            retry_delay_secs: 5,
            ack_timeout_secs: 5,
            flush_timeout_secs: 30,
            config: vec![
                "acks = all".to_string(),
                "message.send.max.retries = 3".to_string(),
                "message.max.bytes = 10485760".to_string(),
                "request.timeout.ms = 30000".to_string(),
            ],
        }
    }
}

impl KafkaConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }

    /// `config` lines split into `(key, value)` pairs; lines without `=` are ignored.
    pub fn client_properties(&self) -> Vec<(&str, &str)> {
        self.config
            .iter()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, _)| !k.is_empty())
            .collect()
    }
}
