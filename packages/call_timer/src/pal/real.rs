//! Real clock backed by [`Instant`].

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::pal::Platform;

/// Reference point for all readings of the real clock in this process.
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic wall clock.
#[derive(Debug)]
pub(crate) struct RealPlatform;

pub(crate) static REAL_PLATFORM: RealPlatform = RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Real clock readings cannot be asserted exactly.
    fn now(&self) -> Duration {
        EPOCH.get_or_init(Instant::now).elapsed()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let first = REAL_PLATFORM.now();
        let second = REAL_PLATFORM.now();

        assert!(second >= first);
    }
}
