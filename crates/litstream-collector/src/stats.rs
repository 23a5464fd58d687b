//! Run and session counters

use chrono::{DateTime, Utc};
use serde::Serialize;

use litstream_core::SourceKind;
use litstream_kafka::BatchStats;

/// Outcome of one [`Collector::run`](crate::Collector::run)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub collected: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunStats {
    pub(crate) fn from_batch(collected: usize, batch: BatchStats) -> Self {
        Self {
            collected,
            sent: batch.sent,
            failed: batch.failed,
            skipped: batch.skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::ops::AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.collected += other.collected;
        self.sent += other.sent;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Running totals over the lifetime of one collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub collected: usize,
    pub delivered: usize,
    pub errors: usize,
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            collected: 0,
            delivered: 0,
            errors: 0,
            started_at,
        }
    }

    /// Snapshot of the session, closed at `ended_at`.
    pub fn report(&self, source: SourceKind, ended_at: DateTime<Utc>) -> SessionReport {
        SessionReport {
            source,
            collected: self.collected,
            delivered: self.delivered,
            errors: self.errors,
            started_at: self.started_at,
            ended_at,
        }
    }
}

/// Final session summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub source: SourceKind,
    pub collected: usize,
    pub delivered: usize,
    pub errors: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}
