use std::time::Duration;

/// Errors produced while configuring a [`LeakyBucket`](crate::LeakyBucket).
///
/// Once a bucket exists none of its operations can fail, so this is the only
/// error type in the crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BucketError {
    /// Capacity was not positive, or the timeframe was zero or unrepresentable.
    ///
    /// No bucket is produced.
    #[error("invalid bucket configuration: capacity {capacity}, timeframe {timeframe}")]
    InvalidConfiguration {
        /// The capacity that was supplied.
        capacity: i64,
        /// The timeframe that was supplied, rendered for display.
        timeframe: String,
    },
}

impl BucketError {
    pub(crate) fn invalid(capacity: i64, timeframe: Duration) -> Self {
        Self::InvalidConfiguration {
            capacity,
            timeframe: format!("{timeframe:?}"),
        }
    }

    pub(crate) fn invalid_secs(capacity: i64, timeframe_secs: f64) -> Self {
        Self::InvalidConfiguration {
            capacity,
            timeframe: format!("{timeframe_secs}s"),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BucketError>;
