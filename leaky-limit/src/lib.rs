//! # leaky-limit
//!
//! `leaky-limit` provides a leaky bucket rate limiter for rolling-window
//! request budgets.
//!
//! ## Core Philosophy
//!
//! Fixed window counters reset abruptly at window boundaries, allowing bursts of
//! twice the limit. A leaky bucket instead fills by one unit per accepted
//! request and drains continuously at `capacity / timeframe` per second, so the
//! budget rolls smoothly with time.
//!
//! ## Key Concepts
//!
//! * **Lazy Evaluation**: Volume is drained at the moment it is observed,
//!   eliminating the need for background worker threads or timers.
//! * **Injectable Time**: Every time-dependent operation has an `_at` variant
//!   taking an explicit [`quanta::Instant`], and the bucket reads its own
//!   [`quanta::Clock`] otherwise. Tests use [`quanta::Clock::mock`].
//! * **No Blocking**: There is no "wait until capacity" call. Use
//!   [`LeakyBucket::time_until_capacity`] to find out how long to sleep.
//! * **Single Writer**: A bucket is a plain value. Guard it with a lock (or shard
//!   buckets per task) when sharing.
//!
//! ## Example
//!
//! ```rust
//! use leaky_limit::LeakyBucket;
//! use std::time::Duration;
//!
//! let mut bucket = LeakyBucket::new(100, Duration::from_secs(60)).unwrap();
//!
//! if bucket.process().is_continue() {
//!     // Request allowed
//! }
//! ```

use std::time::Duration;

mod bucket;
mod config;
mod error;


pub use bucket::LeakyBucket;
pub use bucket::Snapshot;
pub use config::BucketConfig;
pub use error::BucketError;
pub use error::Result;

/// Reasons why a request might be rejected by a bucket.
#[derive(Debug, PartialEq)]
pub enum Reason {
    Overloaded { retry_after: Duration },
}
