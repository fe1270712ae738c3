//! Time source abstraction for the rate gate
//!
//! The core only needs one thing from the platform: a monotonically
//! non-decreasing millisecond counter for elapsed-time calculations in
//! the distance filter. Time moving backward is undefined behavior for
//! this subsystem and must be prevented by the platform's clock.

/// Timestamp in milliseconds since device boot (monotonic) or epoch
pub type Timestamp = u64;

/// Source of time for the link core
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Monotonic time source backed by a hardware tick counter
///
/// Starts at 0 on boot, always increases. The embedded integration is
/// expected to feed the counter from a timer peripheral.
#[derive(Debug, Clone, Default)]
pub struct MonotonicTime {
    ticks_ms: Timestamp,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self { ticks_ms: 0 }
    }

    /// Advance the counter; called from the platform tick handler
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.ticks_ms += elapsed_ms;
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.ticks_ms
    }
}

/// Wall clock time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn monotonic_starts_at_zero() {
        let mut time = MonotonicTime::new();
        assert_eq!(time.now(), 0);

        time.tick(250);
        time.tick(250);
        assert_eq!(time.now(), 500);
    }
}
