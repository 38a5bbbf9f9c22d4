//! Fake clock for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::pal::abstractions::Platform;

/// Fake clock whose readings are controlled by the test.
///
/// Clones share the same reading, so a test can keep one clone and advance time from inside
/// an instrumented function while the wrapper reads from another clone.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakePlatform {
    now: Arc<Mutex<Duration>>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub(crate) fn advance(&self, delta: Duration) {
        let mut now = self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        *now = now
            .checked_add(delta)
            .expect("fake clock overflow - this indicates an unrealistic test scenario");
    }

    pub(crate) fn set_now(&self, value: Duration) {
        *self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned") = value;
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Duration {
        *self
            .now
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let platform = FakePlatform::new();
        assert_eq!(platform.now(), Duration::ZERO);
    }

    #[test]
    fn advance_accumulates() {
        let platform = FakePlatform::new();
        platform.advance(Duration::from_millis(100));
        platform.advance(Duration::from_millis(50));

        assert_eq!(platform.now(), Duration::from_millis(150));
    }

    #[test]
    fn clones_share_reading() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        platform1.set_now(Duration::from_secs(3));
        assert_eq!(platform2.now(), Duration::from_secs(3));

        platform2.advance(Duration::from_secs(1));
        assert_eq!(platform1.now(), Duration::from_secs(4));
    }
}
