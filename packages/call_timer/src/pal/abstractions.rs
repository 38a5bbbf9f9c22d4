//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Duration;

/// Provides the clock used to measure call durations.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Returns the time elapsed since an arbitrary but fixed point in the past.
    ///
    /// The value never decreases between two calls on the same platform instance.
    fn now(&self) -> Duration;
}
