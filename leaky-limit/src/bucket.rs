use std::ops::ControlFlow;
use std::time::Duration;

use quanta::Clock;
use quanta::Instant;
use tracing::debug;
use tracing::trace;

use crate::Reason;
use crate::error::BucketError;
use crate::error::Result;

/// A leaky bucket.
///
/// Every accepted request adds volume, and the bucket drains continuously at
/// `capacity / timeframe` per second. Draining is lazy: it is recomputed from
/// the elapsed time whenever the volume is observed, so there is no background
/// timer.
///
/// The bucket is a plain value. Mutating operations take `&mut self`; callers
/// sharing one between threads must wrap it in a lock themselves.
#[derive(Debug, Clone)]
pub struct LeakyBucket {
    capacity: u64,
    /// Volume drained per second.
    drain_rate: f64,
    volume: f64,
    last_update: Instant,
    clock: Clock,
}

/// The state a persistence layer needs in order to restore a bucket later via
/// [`LeakyBucket::load`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub volume: f64,
    pub last_update: Instant,
}

impl Snapshot {
    /// Whole requests to pass to [`LeakyBucket::load`].
    ///
    /// `load` only accepts whole requests, so fractional volume is rounded up.
    /// A restored bucket may hold up to one unit more than was saved, never less.
    pub fn requests(&self) -> i64 {
        self.volume.ceil() as i64
    }
}

impl LeakyBucket {
    /// Creates an empty bucket that holds `capacity` requests and drains
    /// completely over `timeframe`.
    ///
    /// # Errors
    ///
    /// Returns [`BucketError::InvalidConfiguration`] if `capacity` is not
    /// positive or `timeframe` is zero.
    pub fn new(capacity: i64, timeframe: Duration) -> Result<Self> {
        Self::with_clock(capacity, timeframe, Clock::new())
    }

    /// Same as [`LeakyBucket::new`], reading time from `clock`.
    pub fn with_clock(capacity: i64, timeframe: Duration, clock: Clock) -> Result<Self> {
        if capacity <= 0 || timeframe.is_zero() {
            return Err(BucketError::invalid(capacity, timeframe));
        }
        let drain_rate = capacity as f64 / timeframe.as_secs_f64();
        if !drain_rate.is_finite() || drain_rate <= 0.0 {
            return Err(BucketError::invalid(capacity, timeframe));
        }

        debug!(capacity, drain_rate, "Creating leaky bucket");
        let last_update = clock.now();
        Ok(Self {
            capacity: capacity as u64,
            drain_rate,
            volume: 0.0,
            last_update,
            clock,
        })
    }

    /// Restores previously persisted state.
    ///
    /// `requests` is added as if by [`fill`](Self::fill), then the reference
    /// time is overwritten with `last_update`. No drain is applied for the
    /// loaded amount until time moves past `last_update`.
    pub fn load(mut self, requests: i64, last_update: Instant) -> Self {
        self.fill(requests);
        self.last_update = last_update;
        debug!(requests, volume = self.volume, "Loaded leaky bucket state");
        self
    }

    /// Records `requests` accepted events. Non-positive values are ignored.
    ///
    /// Filling does not drain; the next observation of the volume does.
    pub fn fill(&mut self, requests: i64) {
        if requests > 0 {
            self.volume += requests as f64;
        }
    }

    pub fn has_capacity(&mut self) -> bool {
        let now = self.clock.now();
        self.has_capacity_at(now)
    }

    /// Whether another request fits at `now`.
    ///
    /// Only whole units count against capacity: a volume of `4.9` in a bucket
    /// of capacity `5` still has room.
    pub fn has_capacity_at(&mut self, now: Instant) -> bool {
        self.drain(now);
        self.volume.floor() < self.capacity as f64
    }

    pub fn volume(&mut self) -> f64 {
        let now = self.clock.now();
        self.volume_at(now)
    }

    /// The fill level at `now`, after draining.
    pub fn volume_at(&mut self, now: Instant) -> f64 {
        self.drain(now);
        self.volume
    }

    pub fn time_until_capacity(&mut self) -> Duration {
        let now = self.clock.now();
        self.time_until_capacity_at(now)
    }

    /// How long a caller must wait after `now` before
    /// [`has_capacity_at`](Self::has_capacity_at) returns `true`.
    ///
    /// Zero when there is room already. Callers wanting to block should sleep
    /// for this long rather than poll.
    ///
    /// If `now` is earlier than [`last_update`](Self::last_update) the wait
    /// also covers the gap, since no draining happens before `last_update`.
    ///
    /// The result saturates at [`Duration::MAX`] for volumes that would take
    /// longer than that to drain. Adding it to an `Instant` will then
    /// overflow, so use `checked_add`.
    pub fn time_until_capacity_at(&mut self, now: Instant) -> Duration {
        self.drain(now);
        let capacity = self.capacity as f64;
        if self.volume.floor() < capacity {
            return Duration::ZERO;
        }
        let lag = self.last_update.saturating_duration_since(now);

        // Volume has to drop strictly below capacity.
        let secs = (self.volume - capacity) / self.drain_rate;
        let mut wait = Duration::from_nanos(((secs * 1e9) as u64).saturating_add(1));
        let mut step = Duration::from_nanos(1);
        while (self.volume - wait.as_secs_f64() * self.drain_rate).floor() >= capacity
            && wait < Duration::MAX
        {
            wait = wait.saturating_add(step);
            step = step.saturating_mul(2);
        }
        wait.saturating_add(lag)
    }

    pub fn process(&mut self) -> ControlFlow<Reason> {
        let now = self.clock.now();
        self.process_at(now)
    }

    /// Admits a single request at `now`.
    ///
    /// If there is capacity the bucket is filled by one and the request may
    /// proceed. Otherwise the bucket is left untouched and the reason carries
    /// the time until capacity frees up.
    pub fn process_at(&mut self, now: Instant) -> ControlFlow<Reason> {
        if self.has_capacity_at(now) {
            self.fill(1);
            ControlFlow::Continue(())
        } else {
            let retry_after = self.time_until_capacity_at(now);
            debug!(
                volume = self.volume,
                capacity = self.capacity,
                ?retry_after,
                "Leaky bucket is full"
            );
            ControlFlow::Break(Reason::Overloaded { retry_after })
        }
    }

    /// Drains to `now` and captures the state for persistence.
    pub fn snapshot_at(&mut self, now: Instant) -> Snapshot {
        self.drain(now);
        Snapshot {
            volume: self.volume,
            last_update: self.last_update,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn drain_rate(&self) -> f64 {
        self.drain_rate
    }

    /// The time the volume was last drained (or loaded). Does not drain.
    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    fn drain(&mut self, now: Instant) {
        // An earlier `now` than we have seen is treated as no time passing.
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed.is_zero() {
            return;
        }

        let leaked = elapsed.as_secs_f64() * self.drain_rate;
        self.volume = (self.volume - leaked).max(0.0);
        self.last_update = now;
        trace!(
            elapsed = elapsed.as_secs_f64(),
            leaked,
            volume = self.volume,
            "Drained leaky bucket"
        );
    }
}
