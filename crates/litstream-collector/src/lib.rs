//! Collector harness: fetch from one source, publish through one channel

mod collector;
mod stats;

pub use collector::Collector;
pub use stats::{RunStats, SessionReport, SessionStats};
