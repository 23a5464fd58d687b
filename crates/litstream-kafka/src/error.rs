//! Delivery channel errors

use std::time::Duration;

/// Failure reported by a broker client
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerError {
    /// Broker unreachable or metadata request failed
    Connect(String),
    /// Broker rejected the message
    Send(String),
    /// No acknowledgment within the wait
    Timeout(Duration),
    /// Buffered messages could not be flushed
    Flush(String),
    /// Record could not be encoded
    Serialize(String),
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(msg) => write!(f, "connect failed: {msg}"),
            Self::Send(msg) => write!(f, "send failed: {msg}"),
            Self::Timeout(wait) => write!(f, "no acknowledgment after {wait:?}"),
            Self::Flush(msg) => write!(f, "flush failed: {msg}"),
            Self::Serialize(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for BrokerError {}

impl BrokerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Channel failures surfaced to the caller
#[derive(Debug)]
pub enum PublishError {
    /// Every connection attempt failed; the channel cannot be used
    ConnectionRefused {
        broker: String,
        attempts: u32,
        last: BrokerError,
    },
    /// The channel was already closed
    Closed,
    /// End-of-batch flush failed
    Flush(BrokerError),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionRefused {
                broker,
                attempts,
                last,
            } => write!(
                f,
                "cannot connect to {broker} after {attempts} attempt(s): {last}"
            ),
            Self::Closed => write!(f, "channel is closed"),
            Self::Flush(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectionRefused { last, .. } => Some(last),
            Self::Flush(e) => Some(e),
            Self::Closed => None,
        }
    }
}

impl PublishError {
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_connection_refused() {
        let err = PublishError::ConnectionRefused {
            broker: "kafka:9092".into(),
            attempts: 5,
            last: BrokerError::Connect("transport down".into()),
        };
        assert_eq!(
            err.to_string(),
            "cannot connect to kafka:9092 after 5 attempt(s): connect failed: transport down"
        );
        assert!(err.is_connection_refused());
        assert!(!PublishError::Closed.is_connection_refused());
    }

    #[test]
    fn timeout_classified() {
        assert!(BrokerError::Timeout(Duration::from_secs(5)).is_timeout());
        assert!(!BrokerError::Send("x".into()).is_timeout());
    }
}
