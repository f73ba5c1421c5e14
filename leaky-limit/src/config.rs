use std::time::Duration;

use quanta::Clock;
use serde::Deserialize;
use serde::Serialize;

use crate::LeakyBucket;
use crate::error::BucketError;
use crate::error::Result;

/// Declarative description of a [`LeakyBucket`].
///
/// Values are kept as loosely typed as a config file would hold them, and
/// checked when the bucket is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Number of requests the bucket holds before it is full.
    pub capacity: i64,

    /// Seconds for a full bucket to drain to empty.
    pub timeframe_secs: f64,
}

impl BucketConfig {
    pub fn new(capacity: i64, timeframe_secs: f64) -> Self {
        Self {
            capacity,
            timeframe_secs,
        }
    }

    pub fn timeframe(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeframe_secs)
            .map_err(|_| BucketError::invalid_secs(self.capacity, self.timeframe_secs))
    }

    pub fn build(&self) -> Result<LeakyBucket> {
        self.build_with_clock(Clock::new())
    }

    pub fn build_with_clock(&self, clock: Clock) -> Result<LeakyBucket> {
        LeakyBucket::with_clock(self.capacity, self.timeframe()?, clock)
    }
}
