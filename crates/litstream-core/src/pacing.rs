//! Request pacing for rate-limited upstream APIs

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between consecutive upstream calls.
///
/// The first call goes out immediately; each later call sleeps for
/// whatever remains of `interval` since the previous one started.
/// Not shared across threads: each adapter instance owns its pacer.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_call: Cell<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Cell::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next call is allowed, then mark it as started.
    pub fn wait(&self) {
        if let Some(last) = self.last_call.get() {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last_call.set(Some(Instant::now()));
    }
}
