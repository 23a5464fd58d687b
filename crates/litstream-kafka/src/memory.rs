//! In-process broker for dry runs and tests

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::broker::{Broker, Delivery};
use crate::error::BrokerError;

/// Partitions per topic
pub const PARTITIONS: i32 = 3;

/// A message accepted by [`MemoryBroker`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl StoredMessage {
    /// Payload decoded as JSON, `Null` if it is not valid JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap_or_default()
    }
}

#[derive(Default)]
struct State {
    messages: Vec<StoredMessage>,
    offsets: HashMap<(String, i32), i64>,
    next_unkeyed: i32,
    reject_next: usize,
    timeout_keys: Vec<String>,
    fail_flush: bool,
    refuse_connections: u32,
    send_calls: usize,
    flush_calls: usize,
    connect_calls: usize,
    closed: bool,
}

/// Broker kept in memory.
///
/// Clones share state, so a handle kept by the caller observes what the
/// publisher sent. Keyed messages land on `hash(key) % PARTITIONS`;
/// unkeyed ones rotate across partitions.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<State>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject the next `n` sends.
    pub fn reject_next(&self, n: usize) -> &Self {
        self.state().reject_next = n;
        self
    }

    /// Never acknowledge messages with this key.
    pub fn time_out_key(&self, key: &str) -> &Self {
        self.state().timeout_keys.push(key.to_string());
        self
    }

    pub fn fail_flush(&self, fail: bool) -> &Self {
        self.state().fail_flush = fail;
        self
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_connections(&self, n: u32) -> &Self {
        self.state().refuse_connections = n;
        self
    }

    /// Connection factory handing out handles to this broker.
    pub fn connector(&self) -> impl FnMut() -> Result<MemoryBroker, BrokerError> + '_ {
        move || {
            let mut state = self.state();
            state.connect_calls += 1;
            if state.refuse_connections > 0 {
                state.refuse_connections -= 1;
                return Err(BrokerError::Connect("connection refused".into()));
            }
            state.closed = false;
            Ok(self.clone())
        }
    }

    pub fn messages(&self) -> Vec<StoredMessage> {
        self.state().messages.clone()
    }

    pub fn messages_on(&self, topic: &str) -> Vec<StoredMessage> {
        self.state()
            .messages
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub fn send_calls(&self) -> usize {
        self.state().send_calls
    }

    pub fn flush_calls(&self) -> usize {
        self.state().flush_calls
    }

    pub fn connect_calls(&self) -> usize {
        self.state().connect_calls
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

fn partition_for(key: &str) -> i32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % PARTITIONS as u64) as i32
}

impl Broker for MemoryBroker {
    fn send(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError> {
        let mut state = self.state();
        state.send_calls += 1;

        if state.reject_next > 0 {
            state.reject_next -= 1;
            return Err(BrokerError::Send("broker rejected message".into()));
        }
        if key.is_some_and(|k| state.timeout_keys.iter().any(|t| t == k)) {
            return Err(BrokerError::Timeout(timeout));
        }

        let partition = match key {
            Some(k) => partition_for(k),
            None => {
                let p = state.next_unkeyed;
                state.next_unkeyed = (p + 1) % PARTITIONS;
                p
            }
        };
        let offset = state
            .offsets
            .entry((topic.to_string(), partition))
            .or_insert(0);
        let delivery = Delivery {
            partition,
            offset: *offset,
        };
        *offset += 1;

        state.messages.push(StoredMessage {
            topic: topic.to_string(),
            key: key.map(String::from),
            payload: payload.to_vec(),
            partition,
            offset: delivery.offset,
        });
        Ok(delivery)
    }

    fn flush(&mut self, _timeout: Duration) -> Result<(), BrokerError> {
        let mut state = self.state();
        state.flush_calls += 1;
        if state.fail_flush {
            return Err(BrokerError::Flush("flush timed out".into()));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.state().closed = true;
    }
}
