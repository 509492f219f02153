//! Time utilities and constants.

use chrono::{DateTime, Duration, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate table is trusted (24 hours).
    pub fn rate_cache_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Timeout for a single call to the rates provider (10 seconds).
    pub fn provider_request_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(10)
    }
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Source of the current time.
///
/// Anything with a time-based expiry reads the clock through this trait so
/// tests can move time explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// Clock that only moves when told to.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct ManualClock {
    current: parking_lot::Mutex<Timestamp>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: parking_lot::Mutex::new(start),
        }
    }

    /// Create a clock frozen at the current wall time.
    pub fn starting_now() -> Self {
        Self::new(now())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

/// Elapsed time between `since` and the clock's current reading.
pub fn elapsed_since(clock: &dyn Clock, since: Timestamp) -> Duration {
    clock.now().signed_duration_since(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_cache_ttl_is_one_day() {
        assert_eq!(constants::rate_cache_ttl(), Duration::hours(24));
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::milliseconds(1500));
        assert_eq!(elapsed_since(&clock, start), Duration::milliseconds(1500));

        clock.set(start);
        assert_eq!(elapsed_since(&clock, start), Duration::zero());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
