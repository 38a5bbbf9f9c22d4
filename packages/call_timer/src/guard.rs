//! Reentrancy guard for instrumented calls.

use std::marker::PhantomData;
use std::time::Duration;

use crate::TimerState;
use crate::context::try_with_timer_state;

/// Holds the current thread's reentrancy lock from acquisition until drop.
///
/// Only the outermost instrumented call on a thread obtains a guard. Nested instrumented
/// calls fail to acquire one and run untimed, so the outermost call's duration covers all of
/// them exactly once.
///
/// Dropping the guard releases the lock on every exit path, including unwinding out of a
/// panicking call. Only [`finish()`](Self::finish) records a duration.
#[derive(Debug)]
#[must_use = "the reentrancy lock is released when the guard is dropped"]
pub(crate) struct ReentrancyGuard {
    epoch: u64,
    verbose: bool,

    _single_threaded: PhantomData<*const ()>,
}

impl ReentrancyGuard {
    /// Takes the current thread's lock, returning `None` if an outer call already holds it or
    /// if the thread's state has already been destroyed during thread teardown.
    pub(crate) fn try_acquire() -> Option<Self> {
        try_with_timer_state(|state| {
            state.try_acquire().then(|| Self {
                epoch: state.epoch(),
                verbose: state.is_verbose(),
                _single_threaded: PhantomData,
            })
        })
        .flatten()
    }

    /// Whether the session was verbose when the lock was taken, i.e. whether the caller
    /// needs to render the call arguments.
    pub(crate) fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Records the call and releases the lock.
    ///
    /// If the session was reset while the call was running, the call belongs to neither
    /// session and is not recorded.
    pub(crate) fn finish(
        self,
        name: &str,
        category: &str,
        duration: Duration,
        args: &str,
        kwargs: &str,
    ) {
        // The state may be gone if the thread started tearing down during the call.
        try_with_timer_state(|state| {
            if state.epoch() == self.epoch {
                state.record(name, category, duration, args, kwargs);
            }
        });

        // Lock released by drop.
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        // Nothing to release if the state has already been destroyed.
        try_with_timer_state(TimerState::release);
    }
}
